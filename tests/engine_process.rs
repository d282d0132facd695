//! End-to-end tests against the `mock_engine` binary over real pipes.

use std::thread;
use std::time::{Duration, Instant};

use uci_interface::{EngineConfig, EngineError, EngineHandle, EngineState, Message, UciInterface};

const MOCK: &str = env!("CARGO_BIN_EXE_mock_engine");

fn config() -> EngineConfig {
    EngineConfig::default().with_handshake_timeout(Duration::from_secs(5))
}

fn launch(mode: &str) -> EngineHandle {
    EngineHandle::launch_with(MOCK, &[mode], config()).expect("failed to launch mock engine")
}

#[test]
fn handshake_succeeds_with_well_behaved_engine() {
    let engine = launch("well-behaved");

    assert_eq!(engine.state(), EngineState::Running);
    assert!(engine.pid().is_some());
    assert_eq!(engine.identity().name.as_deref(), Some("Fake"));
    assert_eq!(engine.identity().author.as_deref(), Some("Tester"));

    let options: Vec<&str> = engine.advertised_options().iter().map(Message::as_str).collect();
    assert_eq!(
        options,
        vec![
            "option name Hash type spin default 16 min 1 max 1024",
            "option name Ponder type check default false",
        ]
    );
}

#[test]
fn silent_engine_times_out_and_is_killed() {
    let config = EngineConfig::default().with_handshake_timeout(Duration::from_millis(200));
    let mut engine = EngineHandle::spawn(MOCK, &["silent"], config).unwrap();
    let exits = engine.subscribe_termination();

    let start = Instant::now();
    let err = engine.handshake().unwrap_err();
    assert!(matches!(err, EngineError::Timeout { .. }), "unexpected error: {err}");
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert_eq!(engine.state(), EngineState::Terminated);

    let exit = exits
        .recv_timeout(Duration::from_secs(5))
        .expect("no termination event after kill");
    assert_eq!(Some(exit.pid), engine.pid());
    #[cfg(unix)]
    assert_eq!(exit.signal(), Some(9));
}

#[test]
fn launch_reports_timeout_for_silent_engine() {
    let config = EngineConfig::default().with_handshake_timeout(Duration::from_millis(200));
    let err = EngineHandle::launch_with(MOCK, &["silent"], config).unwrap_err();
    assert!(matches!(err, EngineError::Timeout { .. }));
}

#[test]
fn unterminated_acknowledgement_is_never_framed() {
    let config = EngineConfig::default().with_handshake_timeout(Duration::from_millis(300));
    let mut engine = EngineHandle::spawn(MOCK, &["unterminated"], config).unwrap();

    let err = engine.handshake().unwrap_err();
    assert!(matches!(err, EngineError::Timeout { .. }));
    assert_eq!(engine.buffer().pending(), b"uciok");
    assert_eq!(engine.pop_message(), None);
}

#[test]
fn one_chunk_with_two_lines_pops_both_in_order() {
    let mut engine = launch("burst");

    engine.send("isready").unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut lines = Vec::new();
    while lines.len() < 2 && Instant::now() < deadline {
        match engine.pop_message() {
            Some(message) => lines.push(message.into_string()),
            None => {
                engine
                    .receive_chunk(1024, Some(Duration::from_millis(100)))
                    .unwrap();
            }
        }
    }

    assert_eq!(lines, vec!["readyok", "info string x"]);
    assert_eq!(engine.pop_message(), None);
}

#[test]
fn byte_at_a_time_output_still_handshakes() {
    let engine = launch("trickle");
    assert_eq!(engine.identity().name.as_deref(), Some("Fake"));
}

#[test]
fn request_collects_info_lines_for_subscribers() {
    let mut engine = launch("well-behaved");
    engine.is_ready(Duration::from_secs(5)).unwrap();

    let info = engine.subscribe();
    let best = engine
        .request("go depth 2", "bestmove", Duration::from_secs(5))
        .unwrap();
    assert_eq!(best.as_str(), "bestmove e2e4");

    let seen: Vec<String> = info.try_iter().map(Message::into_string).collect();
    assert_eq!(
        seen,
        vec!["info depth 1 score cp 10", "info depth 2 score cp 12"]
    );
}

#[test]
fn crash_is_observed_by_watcher() {
    let mut engine = launch("crash");
    let exits = engine.subscribe_termination();

    let exit = exits
        .recv_timeout(Duration::from_secs(5))
        .expect("watcher did not report exit");
    assert_eq!(exit.code(), Some(3));
    assert_eq!(engine.state(), EngineState::Terminated);

    assert!(matches!(engine.send("isready"), Err(EngineError::EngineTerminated)));
    assert!(matches!(
        engine.wait_for("readyok", Duration::from_millis(10)),
        Err(EngineError::EngineTerminated)
    ));
    assert!(engine.transport().is_none());
}

#[test]
fn quit_lets_engine_exit_gracefully() {
    let mut engine = launch("well-behaved");
    assert!(engine.quit());
    assert_eq!(engine.state(), EngineState::Terminated);
}

#[test]
fn quit_kills_stubborn_engine() {
    let config = config().with_quit_grace(Duration::from_millis(100));
    let mut engine = EngineHandle::launch_with(MOCK, &["stubborn"], config).unwrap();

    let start = Instant::now();
    assert!(!engine.quit());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(engine.state(), EngineState::Terminated);
}

#[test]
fn kill_is_idempotent() {
    let mut engine = launch("well-behaved");
    engine.kill();
    engine.kill();
    assert_eq!(engine.state(), EngineState::Terminated);
}

#[test]
fn engines_run_independently() {
    let workers: Vec<_> = (0..3)
        .map(|_| {
            thread::spawn(|| {
                let mut engine = launch("well-behaved");
                engine.is_ready(Duration::from_secs(5)).unwrap();
                let pid = engine.pid().unwrap();
                engine.kill();
                pid
            })
        })
        .collect();

    let mut pids: Vec<u32> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    pids.sort_unstable();
    pids.dedup();
    assert_eq!(pids.len(), 3);
}

#[test]
fn interface_enforces_single_init() {
    let mut uci = UciInterface::new(config());
    assert_eq!(uci.state(), EngineState::NotStarted);

    uci.init(MOCK, &["well-behaved"]).unwrap();
    assert_eq!(uci.state(), EngineState::Running);
    assert!(matches!(
        uci.init(MOCK, &["well-behaved"]),
        Err(EngineError::AlreadyInitialized)
    ));

    uci.is_ready(Duration::from_secs(5)).unwrap();
    uci.kill().unwrap();
    assert_eq!(uci.state(), EngineState::Terminated);

    // A terminated engine can be replaced.
    uci.init(MOCK, &["well-behaved"]).unwrap();
    assert_eq!(uci.state(), EngineState::Running);
}

#[test]
fn missing_binary_is_launch_failure() {
    let err = EngineHandle::launch("/definitely/not/an/engine", &[] as &[&str]).unwrap_err();
    assert!(matches!(err, EngineError::LaunchFailed { .. }));
    assert!(!err.to_string().is_empty());
}
