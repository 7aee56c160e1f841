// Конфиг из ENV (единственный тест в бинаре — env не делится с другими тестами).

use anyhow::Result;

use pointfile::consts::HARD_MAX_NAME_LEN;
use pointfile::{AccessMode, ErrorKind, PointLib, PtConfig};

#[test]
fn config_from_env_and_overrides() -> Result<()> {
    std::env::set_var("PT_FSYNC", "off");
    std::env::set_var("PT_LOCK_WAIT", "yes");
    std::env::set_var("PT_MAX_NAME_LEN", "4");

    let cfg = PtConfig::from_env();
    assert!(!cfg.fsync);
    assert!(cfg.lock_wait);
    assert_eq!(cfg.max_name_len, 4);

    let s = cfg.to_string();
    assert!(s.contains("max_name_len: 4"), "{s}");

    // PointLib::new() читает тот же ENV
    let lib = PointLib::new();
    assert_eq!(lib.config().max_name_len, 4);
    let path = std::env::temp_dir().join(format!(
        "ptfile-cfg-{}-{}.he5",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    assert_eq!(lib.create(fid, "toolong").unwrap_err().kind(), ErrorKind::InvalidName);
    let p = lib.create(fid, "ok")?;
    lib.detach(p)?;
    lib.close(fid)?;
    let _ = std::fs::remove_file(&path);

    std::env::set_var("PT_MAX_NAME_LEN", "999999");
    assert_eq!(PtConfig::from_env().max_name_len, HARD_MAX_NAME_LEN);

    // builder-style overrides поверх ENV
    let cfg = PtConfig::from_env().with_fsync(true).with_lock_wait(false).build();
    assert!(cfg.fsync);
    assert!(!cfg.lock_wait);

    for k in ["PT_FSYNC", "PT_LOCK_WAIT", "PT_MAX_NAME_LEN"] {
        std::env::remove_var(k);
    }
    let d = PtConfig::from_env();
    assert!(d.fsync);
    assert!(!d.lock_wait);
    Ok(())
}
