//! Runs dashboard effects as background tasks.

use std::sync::Arc;

use chrono::Local;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::application::{KillService, ScanService};
use crate::ports::{CommandRunner, ListenerSource, SignalSender};
use crate::process::InfoFetcher;

use super::state::{Effect, Message};

/// Spawns one task per [`Effect`] and reports each completion as a
/// [`Message`] on the dashboard's channel.
///
/// Tasks never touch dashboard state; the loop applies their messages.
pub struct Executor<L, R, S> {
    scans: Arc<ScanService<L>>,
    kills: Arc<KillService<R, S>>,
    info: Arc<InfoFetcher<R>>,
    tx: UnboundedSender<Message>,
}

impl<L, R, S> Executor<L, R, S>
where
    L: ListenerSource + 'static,
    R: CommandRunner + 'static,
    S: SignalSender + 'static,
{
    pub fn new(
        scans: Arc<ScanService<L>>,
        kills: Arc<KillService<R, S>>,
        info: Arc<InfoFetcher<R>>,
        tx: UnboundedSender<Message>,
    ) -> Self {
        Self {
            scans,
            kills,
            info,
            tx,
        }
    }

    /// Start `effect`. Returns false for [`Effect::Quit`], which the loop
    /// handles itself.
    pub fn execute(&self, effect: Effect) -> bool {
        let tx = self.tx.clone();
        match effect {
            Effect::Scan(scope) => {
                let scans = Arc::clone(&self.scans);
                tokio::spawn(async move {
                    let result = scans.scan(scope).await;
                    let _ = tx.send(Message::ScanCompleted {
                        at: Local::now(),
                        result,
                    });
                });
            }
            Effect::FetchInfo(pid) => {
                let info = Arc::clone(&self.info);
                tokio::spawn(async move {
                    let result = info.get_info(pid).await;
                    let _ = tx.send(Message::InfoCompleted { pid, result });
                });
            }
            Effect::Kill { entry, mode } => {
                let kills = Arc::clone(&self.kills);
                tokio::spawn(async move {
                    let result = kills.terminate(&entry, mode).await;
                    let _ = tx.send(Message::KillCompleted { entry, result });
                });
            }
            Effect::Quit => {
                debug!("Quit requested");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ScriptedRunner, ScriptedSignals, TermBehavior};
    use crate::application::{KillMode, KillStatus};
    use crate::config::{Config, ScanScope};
    use crate::dashboard::{Action, Dashboard, KillState, Screen};
    use crate::process::{ProcessManager, ProtectedPids};
    use crate::scanner::LsofScanner;
    use tokio::sync::mpsc;

    const LISTEN: &str = "COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME
nginx 1234 root 6u IPv4 0x1 0t0 TCP *:80 (LISTEN)
node 5678 dev 8u IPv6 0x2 0t0 TCP *:3000 (LISTEN)
";

    type TestExecutor =
        Executor<LsofScanner<Arc<ScriptedRunner>>, Arc<ScriptedRunner>, Arc<ScriptedSignals>>;

    fn executor(
        runner: ScriptedRunner,
        signals: ScriptedSignals,
    ) -> (TestExecutor, mpsc::UnboundedReceiver<Message>) {
        let runner = Arc::new(runner);
        let signals = Arc::new(signals);
        let (tx, rx) = mpsc::unbounded_channel();
        let exec = Executor::new(
            Arc::new(ScanService::new(LsofScanner::new(runner.clone()), Config::default())),
            Arc::new(KillService::new(ProcessManager::new(
                runner.clone(),
                signals,
                ProtectedPids::default(),
            ))),
            Arc::new(InfoFetcher::new(runner)),
            tx,
        );
        (exec, rx)
    }

    #[tokio::test]
    async fn test_scan_reports_back() {
        let (exec, mut rx) = executor(
            ScriptedRunner::new().with_output("lsof -iTCP -iUDP -sTCP:LISTEN -P -n", LISTEN),
            ScriptedSignals::new(),
        );

        assert!(exec.execute(Effect::Scan(ScanScope::Listen)));
        match rx.recv().await.unwrap() {
            Message::ScanCompleted {
                result: Ok(entries),
                ..
            } => assert_eq!(entries.len(), 2),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quit_is_not_spawned() {
        let (exec, _rx) = executor(ScriptedRunner::new(), ScriptedSignals::new());
        assert!(!exec.execute(Effect::Quit));
    }

    #[tokio::test]
    async fn test_info_failure_reports_pid() {
        let (exec, mut rx) = executor(ScriptedRunner::new(), ScriptedSignals::new());
        exec.execute(Effect::FetchInfo(42));
        match rx.recv().await.unwrap() {
            Message::InfoCompleted { pid, result } => {
                assert_eq!(pid, 42);
                assert!(result.is_err());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_kill_round_trip() {
        let (exec, mut rx) = executor(
            ScriptedRunner::new()
                .with_output("lsof -iTCP -iUDP -sTCP:LISTEN -P -n", LISTEN)
                .with_output("ps -p 1234 -o comm=", "nginx\n"),
            ScriptedSignals::new().with_process(1234, TermBehavior::ExitAfterProbes(2)),
        );

        let mut dashboard = Dashboard::new(ScanScope::Listen);
        dashboard.update(Message::Resize { height: 30 });
        for effect in dashboard.start() {
            exec.execute(effect);
        }
        let scanned = rx.recv().await.unwrap();
        dashboard.update(scanned);
        assert_eq!(dashboard.selected().unwrap().pid, 1234);

        dashboard.update(Message::Action(Action::Kill));
        let effects = dashboard.update(Message::Action(Action::ConfirmGraceful));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Kill { mode: KillMode::Graceful, .. }]
        ));
        for effect in effects {
            exec.execute(effect);
        }

        let done = rx.recv().await.unwrap();
        assert!(matches!(
            done,
            Message::KillCompleted { result: Ok(KillStatus::Terminated), .. }
        ));
        dashboard.update(done);

        assert_eq!(dashboard.screen(), Screen::KillResult);
        assert!(matches!(
            dashboard.kill_state(),
            Some(KillState::Finished { success: true, .. })
        ));
    }
}
