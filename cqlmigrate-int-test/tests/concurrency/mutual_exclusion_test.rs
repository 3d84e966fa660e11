use cqlmigrate::errors::ErrorKind;
use cqlmigrate::migration::{CasMigrator, MapSource, Migrator, MigratorConfig, Source};
use cqlmigrate::session::memory::InMemorySession;
use cqlmigrate::session::{Session, SessionProvider};
use cqlmigrate_int_test::test_util::{
    cleanup, create_test_context, fixture_source, run_test, RaceInjectingSession, FINAL_DOWN,
    FINAL_UP, INITIAL_UP,
};
use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

const TABLE: &str = "migrations";

#[test]
fn test_lost_claim_is_a_concurrent_migration() {
    run_test(
        create_test_context,
        |ctx| {
            let memory = ctx.session();
            memory.insert_row(TABLE, 2, false);

            // the competitor claims 3 between our state read and our claim
            let racing = RaceInjectingSession::new(memory.clone(), |store: &InMemorySession| {
                let competitor = CasMigrator::new(
                    Session::new(store.clone()),
                    fixture_source(),
                    MigratorConfig::default(),
                );
                competitor.up().expect("competitor wins the race");
            });
            let loser = CasMigrator::new(
                Session::from_arc(racing.clone()),
                fixture_source(),
                MigratorConfig::default(),
            );

            let err = loser.up().unwrap_err();
            assert!(racing.has_raced());
            assert_eq!(err.kind(), &ErrorKind::ConcurrentMigration);

            // body 3 ran once, by the competitor
            assert_eq!(memory.executed(), vec![FINAL_UP]);
            assert_eq!(memory.tracking_rows(TABLE), vec![(2, false), (3, false)]);

            // a retry finds nothing left to do
            loser.up()?;
            assert_eq!(memory.executed().len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_claim_in_flight_blocks_the_loser() {
    run_test(
        create_test_context,
        |ctx| {
            let memory = ctx.session();

            // the competitor has claimed 2 but not committed yet
            let racing = RaceInjectingSession::new(memory.clone(), |store: &InMemorySession| {
                let claim = MigratorConfig::default().claim_stmt(2);
                assert!(store.exec_cas(&claim).unwrap().is_applied());
            });
            let loser = CasMigrator::new(
                Session::from_arc(racing),
                fixture_source(),
                MigratorConfig::default(),
            );

            assert_eq!(loser.up().unwrap_err().kind(), &ErrorKind::ConcurrentMigration);
            assert!(memory.executed().is_empty());

            // until the claim is committed, everyone sees a dirty table
            assert_eq!(loser.up().unwrap_err().kind(), &ErrorKind::Dirty);

            let commit = MigratorConfig::default().update_stmt(2, false);
            assert!(memory.exec_cas(&commit)?.is_applied());
            loser.up()?;
            assert_eq!(memory.tracking_rows(TABLE), vec![(2, false), (3, false)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_threads_race_on_the_same_table() {
    const THREADS: usize = 8;
    const MIGRATIONS: u32 = 20;

    let mut files: HashMap<String, String> = HashMap::new();
    for id in 1..=MIGRATIONS {
        files.insert(
            format!("{}_step.up.cql", id),
            format!("CREATE TABLE t{} (id int PRIMARY KEY)", id),
        );
    }
    let source = Source::new(MapSource::new(files));
    let memory = InMemorySession::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let migrator = CasMigrator::new(
                Session::new(memory.clone()),
                source.clone(),
                MigratorConfig::default(),
            );
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                migrator.up()
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("migrator thread panicked"))
        .collect();

    let mut succeeded = 0;
    for result in &results {
        match result {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(
                matches!(err.kind(), ErrorKind::ConcurrentMigration | ErrorKind::Dirty),
                "unexpected error: {:?}",
                err
            ),
        }
    }
    assert!(succeeded >= 1);

    // losers may have stopped early; a final run completes the catalog
    CasMigrator::new(Session::new(memory.clone()), source, MigratorConfig::default()).up().unwrap();

    let mut executed = memory.executed();
    assert_eq!(executed.len(), MIGRATIONS as usize);
    executed.sort();
    executed.dedup();
    assert_eq!(executed.len(), MIGRATIONS as usize, "a body ran twice");

    let rows = memory.tracking_rows(TABLE);
    assert_eq!(rows.len(), MIGRATIONS as usize);
    assert!(rows.iter().all(|(_, dirty)| !dirty));
}

#[test]
fn test_racing_fresh_migrators_apply_each_body_once() {
    const THREADS: usize = 4;

    let memory = InMemorySession::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let migrator = CasMigrator::new(
                Session::new(memory.clone()),
                fixture_source(),
                MigratorConfig::default(),
            );
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let _ = migrator.up();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("migrator thread panicked");
    }

    CasMigrator::new(Session::new(memory.clone()), fixture_source(), MigratorConfig::default())
        .up()
        .unwrap();

    assert_eq!(memory.executed(), vec![INITIAL_UP, FINAL_UP]);
    assert_eq!(memory.tracking_rows(TABLE), vec![(2, false), (3, false)]);
}

#[test]
fn test_racing_downs_have_one_winner() {
    run_test(
        create_test_context,
        |ctx| {
            let memory = ctx.session();
            ctx.migrator(fixture_source()).up()?;

            // the competitor rolls 3 back between our state read and our mark
            let racing = RaceInjectingSession::before(memory.clone(), "UPDATE", |store: &InMemorySession| {
                let competitor = CasMigrator::new(
                    Session::new(store.clone()),
                    fixture_source(),
                    MigratorConfig::default(),
                );
                competitor.down().expect("competitor wins the race");
            });
            let loser = CasMigrator::new(
                Session::from_arc(racing.clone()),
                fixture_source(),
                MigratorConfig::default(),
            );

            let err = loser.down().unwrap_err();
            assert!(racing.has_raced());
            assert_eq!(err.kind(), &ErrorKind::ConcurrentMigration);
            assert_eq!(memory.tracking_rows(TABLE), vec![(2, false)]);

            let drops = memory.executed().iter().filter(|b| *b == FINAL_DOWN).count();
            assert_eq!(drops, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_commit_rejected_when_the_row_changed_underneath() {
    run_test(
        create_test_context,
        |ctx| {
            let memory = ctx.session();

            // an operator flips the claimed row clean while the body runs
            let racing = RaceInjectingSession::before(memory.clone(), "UPDATE", |store: &InMemorySession| {
                store.insert_row(TABLE, 2, false);
            });
            let migrator = CasMigrator::new(
                Session::from_arc(racing),
                fixture_source(),
                MigratorConfig::default(),
            );

            let err = migrator.up().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConcurrentMigration);
            assert_eq!(memory.executed(), vec![INITIAL_UP]);
            assert_eq!(memory.tracking_rows(TABLE), vec![(2, false)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_release_lost_to_a_competitor() {
    run_test(
        create_test_context,
        |ctx| {
            let memory = ctx.session();
            ctx.migrator(fixture_source()).up()?;

            // the competitor deletes the marked row before our release
            let racing = RaceInjectingSession::before(memory.clone(), "DELETE", |store: &InMemorySession| {
                let release = MigratorConfig::default().release_stmt(3);
                assert!(store.exec_cas(&release).unwrap().is_applied());
            });
            let loser = CasMigrator::new(
                Session::from_arc(racing),
                fixture_source(),
                MigratorConfig::default(),
            );

            let err = loser.down().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConcurrentMigration);
            assert_eq!(memory.tracking_rows(TABLE), vec![(2, false)]);
            assert_eq!(memory.executed().last().map(String::as_str), Some(FINAL_DOWN));
            Ok(())
        },
        cleanup,
    )
}
