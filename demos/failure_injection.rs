//! Failure injection: spawn-time errors, non-zero exits and mid-flight
//! error events, observed through the same surface as the happy path
use mock_spawn::mock::dispatcher::create;
use mock_spawn::mock::error::MockError;
use mock_spawn::mock::event::ProcessEvent;
use mock_spawn::mock::runner::Runner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mock = create(false);
    let sequence = mock.sequence()?;

    // First dispatch fails synchronously, like spawning a missing binary.
    sequence.add(Runner::throws(MockError::Spawn(
        "ENOENT: no such file or directory".into(),
    )));
    // Second one starts, reports a transient error, then exits non-zero.
    sequence.add(Runner::from_fn(|process, completion| async move {
        process.emit_error(MockError::Custom("connection reset".into()));
        tokio::task::yield_now().await;
        completion.exit(7);
    }));

    match mock.spawn("flaky-tool") {
        Ok(_) => unreachable!("first queued runner throws"),
        Err(error) => println!("spawn failed as scripted: {error}"),
    }
    println!("call log after failed spawn: {} entries", mock.calls().len());

    let process = mock.spawn("flaky-tool")?;
    let mut events = process.subscribe();
    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Error { error } => println!("mid-flight error: {error}"),
            ProcessEvent::Exit { code, .. } => println!("exit: {code:?}"),
            ProcessEvent::Close { .. } => break,
            ProcessEvent::Output { .. } => {}
        }
    }
    Ok(())
}
