use cqlmigrate::errors::{ErrorKind, MigrateResult};
use cqlmigrate::migration::{CasMigrator, FsSource, Migrator, MigratorConfig, Source};
use cqlmigrate::session::memory::InMemorySession;
use cqlmigrate::session::Session;
use cqlmigrate_int_test::test_util::{random_path, write_migrations};
use std::thread;
use std::time::{Duration, Instant};

const DIRTY_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> MigrateResult<()> {
    println!("Starting stress test...");

    let count = 500;
    let workers = 16;

    let path = random_path();
    let files: Vec<(String, String)> = (1..=count)
        .flat_map(|id| {
            [
                (
                    format!("{}_table_{}.up.cql", id, id),
                    format!("CREATE TABLE t{} (id uuid PRIMARY KEY, data text)", id),
                ),
                (format!("{}_table_{}.down.cql", id, id), format!("DROP TABLE t{}", id)),
            ]
        })
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, body)| (name.as_str(), body.as_str()))
        .collect();
    write_migrations(&path, &refs)?;

    let source = Source::new(FsSource::new(&path)?);
    let memory = InMemorySession::new();

    let start = Instant::now();
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let migrator = CasMigrator::new(
                Session::new(memory.clone()),
                source.clone(),
                MigratorConfig::default(),
            );
            thread::spawn(move || -> MigrateResult<usize> {
                let mut lost = 0;
                let mut dirty_since: Option<Instant> = None;
                loop {
                    match migrator.up() {
                        Ok(()) => return Ok(lost),
                        Err(e) if e.kind() == &ErrorKind::ConcurrentMigration => {
                            lost += 1;
                            dirty_since = None;
                        }
                        Err(e) if e.kind() == &ErrorKind::Dirty => {
                            // a claim in flight clears quickly, a crashed one never does
                            let since = *dirty_since.get_or_insert_with(Instant::now);
                            if since.elapsed() > DIRTY_TIMEOUT {
                                return Err(e);
                            }
                            thread::yield_now();
                        }
                        Err(e) => return Err(e),
                    }
                }
            })
        })
        .collect();

    let mut lost = 0;
    for handle in handles {
        lost += handle.join().expect("worker panicked")?;
    }
    println!(
        "Applied {} migrations with {} racing workers in {:?} ({} lost races)",
        memory.executed().len(),
        workers,
        start.elapsed(),
        lost
    );

    let start = Instant::now();
    let migrator = CasMigrator::new(Session::new(memory.clone()), source, MigratorConfig::default());
    for _ in 0..count {
        migrator.down()?;
    }
    println!("Rolled back to {:?} in {:?}", migrator.current()?, start.elapsed());

    std::fs::remove_dir_all(&path)?;
    Ok(())
}
