// Жизненный цикл сессий и точек: дубликаты, busy-close, невалидные идентификаторы,
// повторное открытие с усечением.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use pointfile::{AccessMode, ErrorKind, FileId, PointId, PointLib, PtConfig};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("ptfile-life-{prefix}-{pid}-{t}-{id}.he5"))
}

fn lib() -> PointLib {
    PointLib::with_config(PtConfig::default().with_fsync(false))
}

#[test]
fn duplicate_name_keeps_first_point() -> Result<()> {
    let path = unique_path("dup");
    let lib = lib();
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;

    let first = lib.create(fid, "FixedBuoy Point")?;
    let err = lib.create(fid, "FixedBuoy Point").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateName);

    // первый жив и не тронут
    assert_eq!(lib.point_name(first)?, "FixedBuoy Point");
    assert_eq!(lib.live_points(fid)?, vec!["FixedBuoy Point"]);
    assert_eq!(lib.inq_points(fid)?, vec!["FixedBuoy Point"]);

    lib.detach(first)?;
    lib.close(fid)?;
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn close_with_live_points_is_busy() -> Result<()> {
    let path = unique_path("busy");
    let lib = lib();
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    let a = lib.create(fid, "a")?;
    let b = lib.create(fid, "b")?;

    let err = lib.close(fid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceBusy);

    // сессия открыта, точки валидны
    assert!(lib.is_open(fid));
    assert_eq!(lib.point_name(a)?, "a");
    assert_eq!(lib.point_name(b)?, "b");
    let c = lib.create(fid, "c")?;

    lib.detach(a)?;
    assert_eq!(lib.close(fid).unwrap_err().kind(), ErrorKind::ResourceBusy);
    lib.detach(b)?;
    lib.detach(c)?;
    lib.close(fid)?;
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn everything_invalid_after_close() -> Result<()> {
    let path = unique_path("closed");
    let lib = lib();
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    let ids: Vec<PointId> = ["x", "y"]
        .iter()
        .map(|n| lib.create(fid, n))
        .collect::<pointfile::Result<_>>()?;
    for id in &ids {
        lib.detach(*id)?;
    }
    lib.close(fid)?;

    let kinds = [
        lib.close(fid).unwrap_err().kind(),
        lib.create(fid, "z").unwrap_err().kind(),
        lib.attach(fid, "x").unwrap_err().kind(),
        lib.flush(fid).unwrap_err().kind(),
        lib.inq_points(fid).unwrap_err().kind(),
        lib.live_points(fid).unwrap_err().kind(),
        lib.mode(fid).unwrap_err().kind(),
    ];
    assert!(kinds.iter().all(|k| *k == ErrorKind::InvalidHandle), "{kinds:?}");

    for id in ids {
        assert_eq!(lib.detach(id).unwrap_err().kind(), ErrorKind::InvalidHandle);
        assert_eq!(lib.point_file(id).unwrap_err().kind(), ErrorKind::InvalidHandle);
    }
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn double_detach_is_invalid_handle() -> Result<()> {
    let path = unique_path("detach2");
    let lib = lib();
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    let p = lib.create(fid, "p")?;
    lib.detach(p)?;
    assert_eq!(lib.detach(p).unwrap_err().kind(), ErrorKind::InvalidHandle);

    // новый объект с тем же именем получает другой идентификатор
    let p2 = lib.create(fid, "p")?;
    assert_ne!(p, p2);
    assert_eq!(lib.detach(p).unwrap_err().kind(), ErrorKind::InvalidHandle);
    assert_eq!(lib.inq_points(fid)?, vec!["p"], "catalog must not duplicate re-created names");
    lib.detach(p2)?;
    lib.close(fid)?;
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn identifiers_are_kind_checked() -> Result<()> {
    let path = unique_path("kinds");
    let lib = lib();
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    let pid = lib.create(fid, "p")?;

    // point id как file id и наоборот
    let as_file = FileId::from_raw(pid.raw());
    let as_point = PointId::from_raw(fid.raw());
    assert_eq!(lib.create(as_file, "q").unwrap_err().kind(), ErrorKind::InvalidHandle);
    assert_eq!(lib.close(as_file).unwrap_err().kind(), ErrorKind::InvalidHandle);
    assert_eq!(lib.detach(as_point).unwrap_err().kind(), ErrorKind::InvalidHandle);
    assert_eq!(lib.create(FileId::from_raw(0), "q").unwrap_err().kind(), ErrorKind::InvalidHandle);

    // ничего не сломалось
    assert_eq!(lib.live_points(fid)?, vec!["p"]);
    lib.detach(pid)?;
    lib.close(fid)?;
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn create_truncate_twice_discards_first_session() -> Result<()> {
    let path = unique_path("trunc");
    let lib = lib();

    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    let p = lib.create(fid, "first session point")?;
    lib.detach(p)?;
    lib.close(fid)?;

    let fid2 = lib.open(&path, AccessMode::CreateTruncate)?;
    assert_ne!(fid, fid2);
    assert!(lib.inq_points(fid2)?.is_empty(), "truncate must discard old catalog");
    assert_eq!(
        lib.attach(fid2, "first session point").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    lib.close(fid2)?;

    let ro = lib.open(&path, AccessMode::ReadOnly)?;
    assert!(lib.inq_points(ro)?.is_empty());
    lib.close(ro)?;
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn invalid_names_rejected() -> Result<()> {
    let path = unique_path("names");
    let lib = PointLib::with_config(PtConfig::default().with_fsync(false).with_max_name_len(16));
    let fid = lib.open(&path, AccessMode::CreateTruncate)?;
    for bad in ["", "group/point", "0123456789abcdefX"] {
        assert_eq!(lib.create(fid, bad).unwrap_err().kind(), ErrorKind::InvalidName, "{bad:?}");
    }
    assert!(lib.inq_points(fid)?.is_empty());
    lib.close(fid)?;
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn dropping_lib_with_open_session_persists_catalog() -> Result<()> {
    let path = unique_path("drop");
    {
        let lib = lib();
        let fid = lib.open(&path, AccessMode::CreateTruncate)?;
        let _p = lib.create(fid, "left attached")?;
        // drop без detach/close: best-effort flush + снятие лока
    }
    let lib = lib();
    let ro = lib.open(&path, AccessMode::ReadOnly)?;
    assert_eq!(lib.inq_points(ro)?, vec!["left attached"]);
    lib.close(ro)?;
    let _ = fs::remove_file(&path);
    Ok(())
}
