use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::yield_now;
use tokio::time::sleep;

use crate::mock::config::SpawnConfig;
use crate::mock::dispatcher::create;
use crate::mock::error::MockError;
use crate::mock::event::ProcessEvent;
use crate::mock::runner::{Runner, Simple};
use crate::mock::signal::{ProcessSignal, SignalTable};
use crate::mock::state::ProcessState;
use crate::mock::stream::StreamSource;

/// Lets every deferred runner and kill emission run to completion on the
/// current-thread test runtime.
async fn settle() {
    for _ in 0..16 {
        yield_now().await;
    }
}

fn hanging_runner() -> Runner {
    Runner::from_fn(|_process, _completion| async {
        std::future::pending::<()>().await;
    })
}

#[tokio::test]
async fn default_runner_reports_exit_zero_for_every_dispatch() {
    let mock = create(false);
    for command in ["first", "second", "third"] {
        mock.spawn(command).unwrap();
    }
    settle().await;

    let calls = mock.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].command(), "first");
    assert_eq!(calls[1].command(), "second");
    assert_eq!(calls[2].command(), "third");
    for process in &calls {
        assert_eq!(process.exit_code(), Some(0));
        assert_eq!(process.signal(), None);
        assert_eq!(process.state(), ProcessState::Closed);
    }
}

#[tokio::test]
async fn set_default_applies_to_future_dispatches() {
    let mock = create(false);
    mock.set_default(mock.simple(1));

    mock.spawn("a").unwrap();
    mock.spawn("b").unwrap();
    settle().await;

    for process in mock.calls() {
        assert_eq!(process.exit_code(), Some(1));
    }
}

#[tokio::test]
async fn sequence_runners_are_consumed_fifo() {
    let mock = create(false);
    let sequence = mock.sequence().unwrap();
    sequence.add(Simple::new(10));
    sequence.add(Simple::new(11));
    sequence.add(Simple::new(12));

    for _ in 0..4 {
        mock.spawn("step").unwrap();
    }
    settle().await;

    let calls = mock.calls();
    assert_eq!(calls[0].exit_code(), Some(10));
    assert_eq!(calls[1].exit_code(), Some(11));
    assert_eq!(calls[2].exit_code(), Some(12));
    // Queue drained, fourth dispatch fell back to the default runner.
    assert_eq!(calls[3].exit_code(), Some(0));
    assert!(sequence.is_empty());
}

#[tokio::test]
async fn throwing_runner_fails_the_dispatch_call_itself() {
    let mock = create(false);
    let sequence = mock.sequence().unwrap();
    sequence.add(Simple::new(0));
    sequence.add(Runner::throws(MockError::Spawn(
        "ENOENT: no such file or directory".into(),
    )));
    sequence.add(Simple::new(3));

    mock.spawn("ok").unwrap();
    assert_eq!(mock.calls().len(), 1);

    let error = mock.spawn("missing-binary").unwrap_err();
    assert!(matches!(error, MockError::Spawn(_)));
    // The failed dispatch left no trace in the call log.
    assert_eq!(mock.calls().len(), 1);

    let third = mock.spawn("ok-again").unwrap();
    assert_eq!(mock.calls().len(), 2);
    settle().await;
    assert_eq!(third.exit_code(), Some(3));
}

#[tokio::test]
async fn signal_table_decides_which_signals_terminate() {
    let mock = create(false);
    mock.set_signals(
        SignalTable::empty()
            .terminating(ProcessSignal::SIGTERM)
            .ignoring(ProcessSignal::SIGINT),
    );
    mock.set_default(hanging_runner());

    let process = mock.spawn("serve").unwrap();
    let mut events = process.subscribe();
    settle().await;
    assert_eq!(process.state(), ProcessState::Running);

    assert!(!process.kill(ProcessSignal::SIGINT));
    settle().await;
    assert_eq!(process.state(), ProcessState::Running);
    assert_eq!(process.exit_code(), None);
    assert_eq!(process.signal(), None);
    assert!(events.try_recv().is_err());

    assert!(process.kill(ProcessSignal::SIGTERM));
    settle().await;
    assert_eq!(
        events.try_recv().unwrap(),
        ProcessEvent::Exit {
            code: None,
            signal: Some(ProcessSignal::SIGTERM),
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        ProcessEvent::Close {
            code: None,
            signal: Some(ProcessSignal::SIGTERM),
        }
    );
    assert_eq!(process.state(), ProcessState::Closed);
}

#[tokio::test]
async fn signals_absent_from_the_table_are_ignored() {
    let mock = create(false);
    mock.set_default(hanging_runner());

    let process = mock.spawn("serve").unwrap();
    settle().await;

    // SIGUSR1 and unrecognized names are not in the default table.
    assert!(!process.kill(ProcessSignal::SIGUSR1));
    assert!(!process.kill(ProcessSignal::Other("SIGWINCH".into())));
    settle().await;
    assert!(process.is_running());
}

#[tokio::test]
async fn terminate_delivers_sigterm() {
    let mock = create(false);
    mock.set_default(hanging_runner());

    let process = mock.spawn("serve").unwrap();
    settle().await;
    assert!(process.terminate());
    settle().await;

    assert_eq!(process.exit_code(), None);
    assert_eq!(process.signal(), Some(ProcessSignal::SIGTERM));
}

#[tokio::test]
async fn duplicate_completion_is_ignored() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|_process, completion| async move {
        completion.exit(0);
        completion.exit(1);
    }));

    let process = mock.spawn("flaky").unwrap();
    let mut events = process.subscribe();
    settle().await;

    assert_eq!(process.exit_code(), Some(0));
    let mut exits = 0;
    let mut closes = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            ProcessEvent::Exit { code, .. } => {
                assert_eq!(code, Some(0));
                exits += 1;
            }
            ProcessEvent::Close { .. } => closes += 1,
            _ => {}
        }
    }
    assert_eq!(exits, 1);
    assert_eq!(closes, 1);

    // Kill after natural completion is equally a no-op.
    assert!(!process.kill(ProcessSignal::SIGTERM));
    settle().await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn late_completion_after_terminating_kill_is_ignored() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|_process, completion| async move {
        sleep(Duration::from_millis(50)).await;
        completion.exit(0);
    }));

    let process = mock.spawn("slow").unwrap();
    let mut events = process.subscribe();
    settle().await;
    assert!(process.kill(ProcessSignal::SIGTERM));

    sleep(Duration::from_millis(80)).await;
    assert_eq!(process.exit_code(), None);
    assert_eq!(process.signal(), Some(ProcessSignal::SIGTERM));

    let mut exits = 0;
    while let Ok(event) = events.try_recv() {
        if let ProcessEvent::Exit { code, signal } = event {
            assert_eq!(code, None);
            assert_eq!(signal, Some(ProcessSignal::SIGTERM));
            exits += 1;
        }
    }
    assert_eq!(exits, 1);
}

#[tokio::test]
async fn pids_are_unique_and_increasing() {
    let mock = create(false);
    let first = mock.spawn("a").unwrap();
    let second = mock.spawn("b").unwrap();
    assert_ne!(first.pid(), second.pid());
    assert!(second.pid() > first.pid());
}

#[tokio::test]
async fn calls_returns_a_snapshot() {
    let mock = create(false);
    mock.spawn("one").unwrap();
    let snapshot = mock.calls();
    assert_eq!(snapshot.len(), 1);

    mock.spawn("two").unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test]
async fn custom_strategy_selects_by_invocation() {
    let mock = create(false);
    mock.set_strategy(|config| {
        if config.command == "git" {
            Some(Simple::new(42).into())
        } else {
            None
        }
    });

    let git = mock.spawn(SpawnConfig::new("git").args(["fetch"])).unwrap();
    let other = mock.spawn("ls").unwrap();
    settle().await;

    assert_eq!(git.exit_code(), Some(42));
    // Declined by the strategy, handled by the default runner.
    assert_eq!(other.exit_code(), Some(0));
    assert_eq!(mock.sequence().unwrap_err(), MockError::StrategyConflict);
}

#[tokio::test]
async fn canned_runner_writes_output_and_emits_events_in_order() {
    let mock = create(false);
    mock.sequence()
        .unwrap()
        .add(Simple::new(2).stdout("out-data").stderr("err-data"));

    let process = mock.spawn("diag").unwrap();
    let mut events = process.subscribe();

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let done = matches!(event, ProcessEvent::Close { .. });
        seen.push(event);
        if done {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            ProcessEvent::Output {
                chunk: "out-data".to_string(),
                src: StreamSource::Stdout,
            },
            ProcessEvent::Output {
                chunk: "err-data".to_string(),
                src: StreamSource::Stderr,
            },
            ProcessEvent::Exit {
                code: Some(2),
                signal: None,
            },
            ProcessEvent::Close {
                code: Some(2),
                signal: None,
            },
        ]
    );
    assert_eq!(process.stdout().contents(), "out-data");
    assert_eq!(process.stderr().contents(), "err-data");
    assert!(process.stdout().is_ended());
    assert_eq!(
        process.stdout().write("too late"),
        Err(MockError::StreamEnded)
    );
}

#[tokio::test]
async fn runner_error_event_does_not_end_the_process() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|process, completion| async move {
        process.emit_error(MockError::Custom("transient failure".into()));
        yield_now().await;
        completion.exit(0);
    }));

    let process = mock.spawn("wobbly").unwrap();
    let mut events = process.subscribe();

    let mut seen_error = false;
    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Error { error } => {
                assert_eq!(error, MockError::Custom("transient failure".into()));
                seen_error = true;
            }
            ProcessEvent::Exit { code, .. } => {
                // The error arrived first and did not end the process.
                assert!(seen_error);
                assert_eq!(code, Some(0));
                break;
            }
            _ => {}
        }
    }
    assert!(seen_error);
}

#[tokio::test]
async fn error_without_completion_leaves_the_process_running() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|process, _completion| async move {
        process.emit_error(MockError::Custom("stuck".into()));
        std::future::pending::<()>().await;
    }));

    let process = mock.spawn("hung").unwrap();
    settle().await;
    assert!(process.is_running());
    assert_eq!(process.exit_code(), None);
}

#[tokio::test]
async fn nothing_runs_inside_the_dispatch_call_stack() {
    let mock = create(false);
    let process = mock.spawn("quick").unwrap();

    // No await has happened since spawn(): the runner cannot have run.
    assert_eq!(process.state(), ProcessState::Created);
    assert_eq!(process.exit_code(), None);
    let mut events = process.subscribe();
    assert!(events.try_recv().is_err());

    settle().await;
    assert_eq!(process.state(), ProcessState::Closed);
    assert_eq!(process.exit_code(), Some(0));
}

#[tokio::test]
async fn runner_sees_the_invocation_it_serves() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|process, completion| async move {
        let line = format!("{} {}", process.command(), process.args().join(" "));
        process.stdout().write(line).unwrap();
        completion.exit(0);
    }));

    let process = mock
        .spawn(
            SpawnConfig::new("echo")
                .args(["hello", "world"])
                .working_dir("/tmp"),
        )
        .unwrap();
    settle().await;

    assert_eq!(process.stdout().contents(), "echo hello world");
    assert_eq!(process.options().working_dir.as_deref(), Some("/tmp"));
}

#[tokio::test]
async fn runner_reads_what_the_test_wrote_to_stdin() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|process, completion| async move {
        // Give the test a tick to feed stdin before echoing it back.
        yield_now().await;
        let input = process.stdin().contents();
        process.stdout().write(input).unwrap();
        completion.exit(0);
    }));

    let process = mock.spawn("cat").unwrap();
    process.stdin().write("piped input").unwrap();
    settle().await;

    assert_eq!(process.stdout().contents(), "piped input");
}

#[tokio::test]
async fn completion_can_report_a_signal_outcome() {
    let mock = create(false);
    mock.set_default(Runner::from_fn(|_process, completion| async move {
        completion.exit_with(None, Some(ProcessSignal::SIGKILL));
    }));

    let process = mock.spawn("oom-victim").unwrap();
    let mut events = process.subscribe();
    settle().await;

    assert_eq!(
        events.try_recv().unwrap(),
        ProcessEvent::Exit {
            code: None,
            signal: Some(ProcessSignal::SIGKILL),
        }
    );
    assert_eq!(process.signal(), Some(ProcessSignal::SIGKILL));
}

#[tokio::test]
async fn completion_order_follows_runner_pacing_not_dispatch_order() {
    let mock = create(false);
    let order = Arc::new(AtomicUsize::new(0));

    let slow_rank = Arc::new(AtomicUsize::new(0));
    let fast_rank = Arc::new(AtomicUsize::new(0));

    let counter = order.clone();
    let rank = slow_rank.clone();
    mock.sequence().unwrap().add(Runner::from_fn(
        move |_process, completion| {
            let counter = counter.clone();
            let rank = rank.clone();
            async move {
                sleep(Duration::from_millis(40)).await;
                rank.store(counter.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
                completion.exit(0);
            }
        },
    ));
    let counter = order.clone();
    let rank = fast_rank.clone();
    mock.sequence().unwrap().add(Runner::from_fn(
        move |_process, completion| {
            let counter = counter.clone();
            let rank = rank.clone();
            async move {
                rank.store(counter.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
                completion.exit(0);
            }
        },
    ));

    let slow = mock.spawn("slow").unwrap();
    let fast = mock.spawn("fast").unwrap();
    sleep(Duration::from_millis(80)).await;

    assert_eq!(slow.exit_code(), Some(0));
    assert_eq!(fast.exit_code(), Some(0));
    // Dispatched first, finished second.
    assert_eq!(fast_rank.load(Ordering::SeqCst), 1);
    assert_eq!(slow_rank.load(Ordering::SeqCst), 2);
    assert_eq!(mock.calls()[0].pid(), slow.pid());
}

#[tokio::test]
async fn signal_table_changes_do_not_affect_existing_processes() {
    let mock = create(false);
    mock.set_signals(SignalTable::empty().ignoring(ProcessSignal::SIGTERM));
    mock.set_default(hanging_runner());

    let shielded = mock.spawn("shielded").unwrap();
    mock.set_signals(SignalTable::empty().terminating(ProcessSignal::SIGTERM));
    let doomed = mock.spawn("doomed").unwrap();
    settle().await;

    assert!(!shielded.kill(ProcessSignal::SIGTERM));
    assert!(doomed.kill(ProcessSignal::SIGTERM));
    settle().await;
    assert!(shielded.is_running());
    assert_eq!(doomed.state(), ProcessState::Closed);
}
