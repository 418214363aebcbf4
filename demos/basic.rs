//! Basic example: queue two canned runs and print the resulting events
use mock_spawn::mock::config::SpawnConfig;
use mock_spawn::mock::dispatcher::create;
use mock_spawn::mock::event::ProcessEvent;
use mock_spawn::mock::runner::Simple;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mock = create(true);
    let sequence = mock.sequence()?;
    sequence.add(Simple::new(0).stdout("On branch main\nnothing to commit\n"));
    sequence.add(Simple::new(1).stderr("fatal: not a git repository\n"));

    for dir in ["/repo", "/not-a-repo"] {
        let process = mock.spawn(SpawnConfig::new("git").args(["status"]).working_dir(dir))?;
        let mut events = process.subscribe();
        while let Some(event) = events.recv().await {
            match event {
                ProcessEvent::Output { chunk, src } => print!("[{src:?}] {chunk}"),
                ProcessEvent::Exit { code, .. } => println!("exit: {code:?}"),
                ProcessEvent::Close { .. } => break,
                ProcessEvent::Error { error } => eprintln!("error: {error}"),
            }
        }
    }

    println!("recorded {} invocations", mock.calls().len());
    Ok(())
}
