#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

fn descriptor(root: &Path, id: &str, contents: &str) {
    let dir = root.join(PLUGIN_DESCRIPTORS_DIR);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{id}.properties")), contents).unwrap();
}

#[test]
fn descriptors_are_read_in_name_order() {
    let root = tempfile::tempdir().unwrap();
    descriptor(root.path(), "org.b", "implementation-class=org.B\n");
    descriptor(root.path(), "org.a", "# comment\nimplementation-class = org.A\n");
    fs::write(root.path().join(PLUGIN_DESCRIPTORS_DIR).join("README"), "ignored").unwrap();

    let entries = plugin_entries_from_dirs(&[root.path()]).unwrap();

    assert_eq!(
        entries,
        vec![
            PluginEntry::new("org.a", "org.A"),
            PluginEntry::new("org.b", "org.B"),
        ]
    );
}

#[test]
fn directories_keep_their_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let empty = tempfile::tempdir().unwrap();
    descriptor(first.path(), "z", "implementation-class: Z");
    descriptor(second.path(), "a", "implementation-class: A");

    let entries =
        plugin_entries_from_dirs(&[first.path(), empty.path(), second.path()]).unwrap();

    assert_eq!(
        entries,
        vec![PluginEntry::new("z", "Z"), PluginEntry::new("a", "A")]
    );
}

#[test]
fn descriptor_without_implementation_class_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    descriptor(root.path(), "foo", "other=value\n");

    let error = plugin_entries_from_dirs(&[root.path()]).unwrap_err();

    assert!(matches!(error, ScanError::MissingImplementationClass { .. }));
}

#[test]
fn catalogue_file_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugins.properties");
    fs::write(
        &path,
        "! header\n\norg.example.foo = org.example.FooPlugin\nbar=BarPlugin\n  baz : Baz  \n",
    )
    .unwrap();

    let entries = read_catalogue_file(&path).unwrap();

    assert_eq!(
        entries,
        vec![
            PluginEntry::new("org.example.foo", "org.example.FooPlugin"),
            PluginEntry::new("bar", "BarPlugin"),
            PluginEntry::new("baz", "Baz"),
        ]
    );
}

#[test]
fn malformed_line_reports_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugins.properties");
    fs::write(&path, "a = A\nnot a pair\n").unwrap();

    match read_catalogue_file(&path).unwrap_err() {
        ScanError::Malformed { line, .. } => assert_eq!(line, 2),
        other => panic!("expected a malformed line, got {other:?}"),
    }
}

#[test]
fn missing_catalogue_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = read_catalogue_file(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(error, ScanError::Io { .. }));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_descriptor_name_is_rejected() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let root = tempfile::tempdir().unwrap();
    descriptor(root.path(), "ok", "implementation-class=Ok\n");
    let bad = root
        .path()
        .join(PLUGIN_DESCRIPTORS_DIR)
        .join(OsStr::from_bytes(b"bad\xFF.properties"));
    fs::write(&bad, "implementation-class=Bad\n").unwrap();

    let error = plugin_entries_from_dirs(&[root.path()]).unwrap_err();

    match error {
        ScanError::NonUtf8Id { path } => assert_eq!(path, bad),
        other => panic!("expected a non UTF-8 id error, got {other:?}"),
    }
}
