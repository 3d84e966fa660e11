use cqlmigrate::errors::ErrorKind;
use cqlmigrate::migration::{CasMigrator, FsSource, Migrator, MigratorConfig, Source};
use cqlmigrate::session::{LoggingSession, Session};
use cqlmigrate_int_test::test_util::{
    cleanup, create_test_context, fixture_source, run_test, write_migrations, FINAL_DOWN,
    FINAL_UP, INITIAL_UP,
};

const TABLE: &str = "migrations";

#[test]
fn test_up_applies_the_directory_in_order() {
    run_test(
        create_test_context,
        |ctx| {
            let migrator = ctx.migrator(Source::new(FsSource::new(ctx.path())?));
            migrator.up()?;

            let session = ctx.session();
            assert_eq!(session.tracking_rows(TABLE), vec![(2, false), (3, false)]);
            assert_eq!(session.executed(), vec![INITIAL_UP, FINAL_UP]);
            assert_eq!(migrator.current()?, Some(3));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_second_up_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            let migrator = ctx.migrator(Source::new(FsSource::new(ctx.path())?));
            migrator.up()?;

            let session = ctx.session();
            let rows = session.tracking_rows(TABLE);
            let writes = session.write_count();

            migrator.up()?;

            assert_eq!(session.tracking_rows(TABLE), rows);
            assert_eq!(session.write_count(), writes);
            assert_eq!(session.executed().len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_up_down_up_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let migrator = ctx.migrator(fixture_source());
            let session = ctx.session();

            migrator.up()?;
            assert_eq!(session.tracking_rows(TABLE), vec![(2, false), (3, false)]);

            migrator.down()?;
            assert_eq!(session.tracking_rows(TABLE), vec![(2, false)]);
            assert_eq!(session.executed().last().map(String::as_str), Some(FINAL_DOWN));
            assert_eq!(migrator.current()?, Some(2));

            migrator.up()?;
            assert_eq!(session.tracking_rows(TABLE), vec![(2, false), (3, false)]);
            assert_eq!(
                session.executed(),
                vec![INITIAL_UP, FINAL_UP, FINAL_DOWN, FINAL_UP]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_down_stops_at_a_migration_without_down_body() {
    run_test(
        create_test_context,
        |ctx| {
            let migrator = ctx.migrator(fixture_source());
            migrator.up()?;
            migrator.down()?;

            let err = migrator.down().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotExist);
            assert_eq!(ctx.session().tracking_rows(TABLE), vec![(2, false)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_new_files_are_picked_up_by_a_later_run() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.migrator(Source::new(FsSource::new(ctx.path())?)).up()?;

            write_migrations(
                ctx.path(),
                &[
                    ("10_index.up.cql", "CREATE INDEX ON bar (data)"),
                    ("not_a_migration.txt", "ignored"),
                ],
            )?;
            let migrator = ctx.migrator(Source::new(FsSource::new(ctx.path())?));
            migrator.up()?;

            assert_eq!(migrator.current()?, Some(10));
            assert_eq!(
                ctx.session().executed().last().map(String::as_str),
                Some("CREATE INDEX ON bar (data)")
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_custom_table_through_a_logging_session() {
    run_test(
        create_test_context,
        |ctx| {
            let session = Session::new(LoggingSession::with_level(
                Session::new(ctx.session()),
                log::Level::Info,
            ));
            let config = MigratorConfig::builder()
                .table("app.schema_migrations")
                .build()?;
            let migrator = CasMigrator::new(session, fixture_source(), config);

            migrator.up()?;

            let memory = ctx.session();
            assert!(memory.tracking_rows(TABLE).is_empty());
            assert_eq!(
                memory.tracking_rows("app.schema_migrations"),
                vec![(2, false), (3, false)]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_separate_tables_track_separately() {
    run_test(
        create_test_context,
        |ctx| {
            let first = ctx.migrator(fixture_source());
            let second = CasMigrator::new(
                Session::new(ctx.session()),
                fixture_source(),
                MigratorConfig::builder().table("other_migrations").build()?,
            );

            first.up()?;
            second.up()?;
            second.down()?;

            let memory = ctx.session();
            assert_eq!(memory.tracking_rows(TABLE), vec![(2, false), (3, false)]);
            assert_eq!(memory.tracking_rows("other_migrations"), vec![(2, false)]);
            Ok(())
        },
        cleanup,
    )
}
