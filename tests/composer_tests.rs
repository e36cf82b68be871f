//! Composer tests against the sample project on disk.

use std::collections::BTreeMap;

use boardsmith::boardfile;
use boardsmith::composer::{ComposeError, Composer, ConfigContext};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use tempfile::tempdir;

const PROJECT: &str = "tests/data/generic";

#[fixture]
fn composer() -> Composer {
    let context = ConfigContext::open(PROJECT).expect("open sample project");
    Composer::new(context)
}

#[rstest]
fn boardfile_composes_from_disk() {
    let file = boardfile::from_path(Utf8Path::new(PROJECT).join("Boardfile")).expect("load");
    let context = ConfigContext::open(PROJECT).expect("open");
    let composition = boardfile::compose(&file, context).expect("compose");
    let board = &composition.board;
    assert_eq!(board.board_id(), 32);
    assert_eq!(board.setting("CONFIG_BT_ENABLED"), Some("y"));
    assert_eq!(board.setting("CONFIG_BT_BLUEDROID_ENABLED"), Some("n"));
    assert_eq!(
        board.settings().origin("CONFIG_LOG_DEFAULT_LEVEL"),
        Some(Utf8Path::new("boards/sdkconfig.base"))
    );
    assert_eq!(
        board.setting("CONFIG_PARTITION_TABLE_CUSTOM_FILENAME"),
        Some("\"partitions.csv\"")
    );
    let keys: Vec<&str> = board.settings().iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        [
            "CONFIG_BT_ENABLED",
            "CONFIG_LOG_DEFAULT_LEVEL",
            "CONFIG_PARTITION_TABLE_CUSTOM_FILENAME",
            "CONFIG_BT_NIMBLE_ENABLED",
            "CONFIG_BT_BLUEDROID_ENABLED",
        ]
    );
}

#[rstest]
fn reversed_fragments_flip_the_winner(composer: Composer) {
    let board = composer
        .assemble_board_config(
            32,
            vec![
                Utf8PathBuf::from("boards/sdkconfig.ble"),
                Utf8PathBuf::from("boards/sdkconfig.base"),
            ],
            Vec::new(),
            None,
            BTreeMap::new(),
        )
        .expect("assemble");
    assert_eq!(board.setting("CONFIG_BT_ENABLED"), Some("n"));
    assert_eq!(
        board.settings().origin("CONFIG_BT_ENABLED"),
        Some(Utf8Path::new("boards/sdkconfig.base"))
    );
}

#[rstest]
fn missing_fragments_on_disk_are_all_named(composer: Composer) {
    let err = composer
        .assemble_board_config(
            32,
            vec![
                Utf8PathBuf::from("boards/sdkconfig.base"),
                Utf8PathBuf::from("boards/absent.conf"),
                Utf8PathBuf::from("boards"),
            ],
            Vec::new(),
            None,
            BTreeMap::new(),
        )
        .expect_err("missing fragments");
    match err {
        ComposeError::MissingFragment { paths } => {
            assert_eq!(paths, ["boards/absent.conf", "boards"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn missing_manifest_on_disk_fails(composer: Composer) {
    let err = composer
        .assemble_board_config(
            32,
            Vec::new(),
            Vec::new(),
            Some(Utf8PathBuf::from("boards/frozen.py")),
            BTreeMap::new(),
        )
        .expect_err("missing manifest");
    assert!(matches!(err, ComposeError::MissingManifest { path } if path == "boards/frozen.py"));
}

#[rstest]
fn absolute_fragment_paths_are_read(composer: Composer) {
    let absolute = Utf8PathBuf::from_path_buf(
        std::fs::canonicalize(format!("{PROJECT}/boards/sdkconfig.ble")).expect("canonicalize"),
    )
    .expect("utf-8 path");
    let board = composer
        .assemble_board_config(32, vec![absolute.clone()], Vec::new(), None, BTreeMap::new())
        .expect("assemble");
    assert_eq!(board.settings().origin("CONFIG_BT_ENABLED"), Some(absolute.as_path()));
}

#[rstest]
fn fragments_shared_above_the_project_root_are_read() {
    let temp = tempdir().expect("temp dir");
    let base = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
    std::fs::create_dir_all(base.join("proj")).expect("create project dir");
    std::fs::create_dir_all(base.join("shared")).expect("create shared dir");
    std::fs::write(base.join("shared/sdkconfig.base"), "CONFIG_LOG=2\n").expect("write shared");

    let composer = Composer::new(ConfigContext::open(base.join("proj")).expect("open"));
    let board = composer
        .assemble_board_config(
            32,
            vec![Utf8PathBuf::from("../shared/sdkconfig.base")],
            Vec::new(),
            None,
            BTreeMap::new(),
        )
        .expect("assemble");
    assert_eq!(board.setting("CONFIG_LOG"), Some("2"));
    assert_eq!(
        board.settings().origin("CONFIG_LOG"),
        Some(Utf8Path::new("../shared/sdkconfig.base"))
    );
}
