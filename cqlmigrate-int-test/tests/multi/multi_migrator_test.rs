use cqlmigrate::errors::ErrorKind;
use cqlmigrate::migration::{CasMigrator, MapSource, Migrator, MigratorConfig, MultiMigrator, Source};
use cqlmigrate::session::memory::InMemorySession;
use cqlmigrate::session::Session;
use cqlmigrate_int_test::test_util::{cleanup, create_test_context, fixture_source, run_test};

fn migrator_for(memory: &InMemorySession, table: &str, source: Source) -> CasMigrator {
    CasMigrator::new(
        Session::new(memory.clone()),
        source,
        MigratorConfig::builder()
            .table(table)
            .build()
            .expect("valid table name"),
    )
}

fn users_source() -> Source {
    Source::new(
        [
            ("1_users.up.cql", "CREATE TABLE users (id uuid PRIMARY KEY)"),
            ("1_users.down.cql", "DROP TABLE users"),
        ]
        .into_iter()
        .collect::<MapSource>(),
    )
}

#[test]
fn test_multi_migrator_runs_every_migrator() {
    run_test(
        create_test_context,
        |ctx| {
            let session = ctx.session();
            let multi = MultiMigrator::default()
                .with(migrator_for(&session, "app_migrations", fixture_source()))
                .with(migrator_for(&session, "users_migrations", users_source()));

            multi.up()?;
            assert_eq!(
                session.tracking_rows("app_migrations"),
                vec![(2, false), (3, false)]
            );
            assert_eq!(session.tracking_rows("users_migrations"), vec![(1, false)]);

            multi.down()?;
            assert_eq!(session.tracking_rows("app_migrations"), vec![(2, false)]);
            assert!(session.tracking_rows("users_migrations").is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_one_failure_does_not_stop_the_others() {
    run_test(
        create_test_context,
        |ctx| {
            let session = ctx.session();
            session.insert_row("app_migrations", 2, true);

            let multi = MultiMigrator::default()
                .with(migrator_for(&session, "app_migrations", fixture_source()))
                .with(migrator_for(&session, "users_migrations", users_source()));

            let err = multi.up().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Dirty);
            assert_eq!(session.tracking_rows("users_migrations"), vec![(1, false)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_several_failures_are_combined() {
    run_test(
        create_test_context,
        |ctx| {
            let session = ctx.session();
            session.insert_row("app_migrations", 2, true);
            session.fail_on("CREATE TABLE users");

            let multi = MultiMigrator::default()
                .with(migrator_for(&session, "app_migrations", fixture_source()))
                .with(migrator_for(&session, "users_migrations", users_source()));

            let err = multi.up().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MultipleErrors);
            assert!(err.message().starts_with("2 migrations failed"));

            let kinds: Vec<&ErrorKind> = err.related().iter().map(|e| e.kind()).collect();
            assert_eq!(kinds, vec![&ErrorKind::Dirty, &ErrorKind::ExecutionError]);
            Ok(())
        },
        cleanup,
    )
}
