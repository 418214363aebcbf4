//! Signal delivery: a hung process, an ignored signal, then a terminating one
use mock_spawn::mock::dispatcher::create;
use mock_spawn::mock::event::ProcessEvent;
use mock_spawn::mock::runner::Runner;
use mock_spawn::mock::signal::{ProcessSignal, SignalTable};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mock = create(false);
    mock.set_signals(
        SignalTable::empty()
            .terminating(ProcessSignal::SIGTERM)
            .ignoring(ProcessSignal::SIGINT),
    );
    // A server that never exits on its own.
    mock.set_default(Runner::from_fn(|process, _completion| async move {
        process.stdout().write("listening on :8080\n").ok();
        std::future::pending::<()>().await;
    }));

    let process = mock.spawn("serve")?;
    let mut events = process.subscribe();
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    println!("SIGINT delivered: {}", process.kill(ProcessSignal::SIGINT));
    println!("still running: {}", process.is_running());

    println!("SIGTERM delivered: {}", process.kill(ProcessSignal::SIGTERM));
    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Exit { code, signal } => {
                println!("exit: code={code:?} signal={signal:?}");
            }
            ProcessEvent::Close { .. } => break,
            _ => {}
        }
    }
    Ok(())
}
