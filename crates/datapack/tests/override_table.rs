use terrane_datapack::{DataPack, OverrideTable};
use serde_json::json;
use std::fs;
use std::path::Path;

const CATEGORIES: [&str; 3] = [
    "worldgen/noise_settings",
    "worldgen/noise",
    "worldgen/density_function",
];

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_every_document_yields_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("worldgen/noise", "ridge.json"),
        ("worldgen/noise", "overworld/continents.json"),
        ("worldgen/noise", "overworld/deep/erosion.json"),
        ("worldgen/density_function", "overworld/base_3d_noise.json"),
        ("worldgen/noise_settings", "overworld.json"),
    ];
    for (category, file) in files {
        write(dir.path(), &format!("data/minecraft/{category}/{file}"), "{}");
    }
    write(dir.path(), "data/minecraft/worldgen/noise/README.md", "# notes");

    let table = OverrideTable::build(&DataPack::new(dir.path()), &CATEGORIES);

    assert_eq!(table.document_count(), files.len());
    for (category, file) in files {
        let identifier = format!("minecraft:{}", file.trim_end_matches(".json"));
        assert!(
            table.get(category).unwrap().contains_key(&identifier),
            "{identifier} missing from {category}"
        );
    }
    assert!(table.missing().is_empty());
}

#[test]
fn test_empty_pack() {
    let dir = tempfile::tempdir().unwrap();
    let table = OverrideTable::build(&DataPack::new(dir.path().join("absent")), &CATEGORIES);

    assert_eq!(table.categories().count(), 3);
    assert_eq!(table.document_count(), 0);
    assert_eq!(table.missing().len(), 3);
}

#[test]
fn test_custom_namespace() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data/terrane/worldgen/noise/a.json", r#"{"firstOctave": -3}"#);

    let pack = DataPack::new(dir.path()).with_namespace("terrane");
    let table = OverrideTable::build(&pack, &["worldgen/noise"]);

    assert_eq!(
        table.get("worldgen/noise").unwrap().get("terrane:a"),
        Some(&json!({ "firstOctave": -3 }))
    );
}

#[cfg(unix)]
#[test]
fn test_colliding_identifiers_keep_last_document() {
    let dir = tempfile::tempdir().unwrap();
    let base = "data/minecraft/worldgen/noise";
    write(dir.path(), &format!("{base}/a/b.json"), "1");
    write(dir.path(), &format!("{base}/a\\b.json"), "2");

    let table = OverrideTable::build(&DataPack::new(dir.path()), &["worldgen/noise"]);
    let mapping = table.get("worldgen/noise").unwrap();

    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get("minecraft:a/b"), Some(&json!(2)));
}
