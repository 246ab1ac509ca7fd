//! Pool and executor flows against a scripted connector

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use dockhand_core::error::{PoolResult, SessionError, SessionResult};
use dockhand_core::{
    CommandExecutor, CommandOutput, ConnectionPool, Connector, PoolConfig, PoolError,
    RemoteSession,
};

/// Session whose execute calls fail while the shared flag is set
struct ScriptedSession {
    serial: usize,
    fail_execute: Arc<AtomicBool>,
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn execute(&mut self, command: &str) -> SessionResult<CommandOutput> {
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(SessionError::Transport("broken pipe".to_string()));
        }
        Ok(CommandOutput {
            exit_code: 0,
            stdout: format!("{}:{}", self.serial, command),
            stderr: String::new(),
        })
    }

    async fn is_alive(&mut self) -> bool {
        true
    }

    fn close(&mut self) -> SessionResult<()> {
        Ok(())
    }
}

struct ScriptedConnector {
    dials: AtomicUsize,
    fail_execute: Arc<AtomicBool>,
}

impl ScriptedConnector {
    fn new() -> Self {
        Self {
            dials: AtomicUsize::new(0),
            fail_execute: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _target: &str) -> PoolResult<Box<dyn RemoteSession>> {
        let serial = self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            serial,
            fail_execute: Arc::clone(&self.fail_execute),
        }))
    }
}

fn pool_with(connector: Arc<ScriptedConnector>) -> Arc<ConnectionPool> {
    Arc::new(ConnectionPool::new(connector, PoolConfig::new()))
}

#[tokio::test]
async fn sequential_commands_reuse_one_connection() {
    let connector = Arc::new(ScriptedConnector::new());
    let pool = pool_with(Arc::clone(&connector));
    let executor = CommandExecutor::new(Arc::clone(&pool));

    for _ in 0..3 {
        let output = executor.execute("web-1", "uptime").await.expect("execute");
        assert!(output.success());
    }

    assert_eq!(connector.dials.load(Ordering::SeqCst), 1);
    assert_eq!(pool.idle_count("web-1"), 1);
    pool.shutdown().await;
}

#[tokio::test]
async fn failed_command_discards_the_connection() {
    let connector = Arc::new(ScriptedConnector::new());
    let pool = pool_with(Arc::clone(&connector));
    let executor = CommandExecutor::new(Arc::clone(&pool));

    connector.fail_execute.store(true, Ordering::SeqCst);
    let err = executor.execute("web-1", "uptime").await.unwrap_err();
    assert!(matches!(err, PoolError::Execution { .. }));
    // the broken session must not be returned to the idle set
    assert_eq!(pool.idle_count("web-1"), 0);

    connector.fail_execute.store(false, Ordering::SeqCst);
    let output = executor.execute("web-1", "uptime").await.expect("execute");
    assert!(output.stdout.starts_with("1:"));
    assert_eq!(connector.dials.load(Ordering::SeqCst), 2);
    pool.shutdown().await;
}

#[tokio::test]
async fn targets_pool_independently() {
    let connector = Arc::new(ScriptedConnector::new());
    let pool = pool_with(Arc::clone(&connector));
    let executor = CommandExecutor::new(Arc::clone(&pool));

    executor.execute("web-1", "uptime").await.expect("web-1");
    executor.execute("db-1", "uptime").await.expect("db-1");

    assert_eq!(connector.dials.load(Ordering::SeqCst), 2);
    assert_eq!(pool.idle_count("web-1"), 1);
    assert_eq!(pool.idle_count("db-1"), 1);
    pool.shutdown().await;
}

#[tokio::test]
async fn concurrent_commands_each_get_their_own_session() {
    let connector = Arc::new(ScriptedConnector::new());
    let pool = pool_with(Arc::clone(&connector));
    let executor = CommandExecutor::new(Arc::clone(&pool));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            executor.execute("web-1", "uptime").await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("execute");
    }

    // every concurrently-held session returns to the idle set
    let dials = connector.dials.load(Ordering::SeqCst);
    assert!(dials >= 1 && dials <= 4);
    assert_eq!(pool.idle_count("web-1"), dials);
    pool.shutdown().await;
}
