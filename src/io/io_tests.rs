use crate::collision::ClosestDistance;
use crate::io::format::{log_title, write_subtitle, ReportSection};
use crate::io::{read_dbnet_yaml, write_dbnet_yaml};

#[test]
fn test_io_yaml_write_then_read() {
    let mut path = std::env::temp_dir();
    path.push(format!("dbnet_io_test_{}", std::process::id()));
    let closest = ClosestDistance::PerSublattice(vec![0.1, 0.25]);
    write_dbnet_yaml(&path, &closest).unwrap();

    path.set_extension("yml");
    let read: ClosestDistance = read_dbnet_yaml(&path).unwrap();
    assert_eq!(read, closest);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_io_yaml_missing_file() {
    let res = read_dbnet_yaml::<ClosestDistance, _>("this/file/does/not/exist.yml");
    assert!(res.is_err());
}

#[test]
fn test_io_format_subtitle_is_underlined() {
    struct Section;

    impl std::fmt::Display for Section {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write_subtitle(f, "Star ω1")?;
            writeln!(f, "body")
        }
    }

    let text = Section.to_string();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec!["Star ω1", "═══════", "body"]);

    // Logging without an initialised logger is a no-op.
    Section.log_report();
    log_title("Dumbbell Jump Networks");
}
