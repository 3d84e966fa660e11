use cqlmigrate::errors::{ErrorKind, MigrateResult};
use cqlmigrate::migration::{FsSource, MapSource, Migration, Source, SourceProvider};
use cqlmigrate_int_test::test_util::{
    cleanup, create_test_context, random_path, run_test, write_migrations,
};
use std::io::Read;

fn read(m: &Migration, up: bool) -> MigrateResult<String> {
    let mut reader = if up { m.up()? } else { m.down()? };
    let mut body = String::new();
    reader.read_to_string(&mut body)?;
    Ok(body)
}

fn assert_navigation(source: &Source) -> MigrateResult<()> {
    let first = source.first()?;
    assert_eq!(first.id(), 2);
    assert_eq!(read(&first, true)?, "foo");
    assert_eq!(read(&first, false).unwrap_err().kind(), &ErrorKind::NotExist);

    let next = source.next(2)?;
    assert_eq!(next, Some(3));

    let last = source.get(3)?;
    assert_eq!(read(&last, true)?, "bar");
    assert_eq!(read(&last, false)?, "bar");

    assert_eq!(source.prev(2)?, None);
    assert_eq!(source.prev(3)?, Some(2));
    assert_eq!(source.next(3)?, None);
    Ok(())
}

#[test]
fn test_fs_source_navigation() -> MigrateResult<()> {
    let dir = random_path();
    write_migrations(
        &dir,
        &[
            ("3_final.down.cql", "bar"),
            ("2_initial.up.cql", "foo"),
            ("3_final.up.cql", "bar"),
        ],
    )?;

    let result = assert_navigation(&Source::new(FsSource::new(&dir)?));
    std::fs::remove_dir_all(&dir)?;
    result
}

#[test]
fn test_map_source_navigation_skips_other_files() -> MigrateResult<()> {
    let source: MapSource = [
        ("3_final.down.cql", "bar"),
        ("2_initial.up.cql", "foo"),
        ("3_final.up.cql", "bar"),
        ("other_file", "fuz"),
    ]
    .into_iter()
    .collect();

    assert_eq!(source.len(), 2);
    assert_navigation(&Source::new(source))
}

#[test]
fn test_unknown_ids() -> MigrateResult<()> {
    let source: MapSource = [("2_initial.up.cql", "foo")].into_iter().collect();

    assert_eq!(source.get(7).unwrap_err().kind(), &ErrorKind::NotExist);
    assert_eq!(source.next(7).unwrap_err().kind(), &ErrorKind::NotExist);
    assert_eq!(source.prev(7).unwrap_err().kind(), &ErrorKind::NotExist);
    Ok(())
}

#[test]
fn test_fs_source_ignores_subdirectories() {
    run_test(
        create_test_context,
        |ctx| {
            write_migrations(
                std::path::Path::new(ctx.path()).join("4_nested.up.cql"),
                &[("5_deep.up.cql", "SELECT 1")],
            )?;

            let source = FsSource::new(ctx.path())?;
            assert_eq!(source.len(), 2);
            assert_eq!(source.next(3)?, None);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_fs_source_on_a_missing_directory() {
    let err = FsSource::new(random_path()).err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::IOError);
}
