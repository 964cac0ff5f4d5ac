use partfs::{ErrorKind, InodeType};
use partfs_tool_lib::{CommandError, Config, Engine, NO_COMMANDS};
use std::path::PathBuf;

fn disk_path(test: &str) -> String {
    let dir = std::env::temp_dir().join(format!("partfs-engine-{}", std::process::id()));
    let path: PathBuf = dir.join(format!("{}.mia", test));
    let _ = std::fs::remove_file(&path);

    return path.to_string_lossy().into_owned();
}

/// A disk with `Part1` mounted as 781A, formatted, and root logged in.
fn ready_engine(test: &str) -> (Engine, String) {
    let path = disk_path(test);
    let mut engine = Engine::new(Config::default());

    let out = engine.run_command_line(&format!(
        "mkdisk -size=3000 -unit=K -path={p}\n\
         fdisk -size=300 -path={p} -name=Part1\n\
         mount -path={p} -name=Part1\n\
         mkfs -id=781A\n\
         login -user=root -pass=123 -id=781A",
        p = path
    ));

    assert!(!out.contains("Error"), "{}", out);

    return (engine, path);
}

#[test]
fn test_end_to_end() {
    let path = disk_path("end_to_end");
    let mut engine = Engine::new(Config::default());

    let out = engine.run_command_line(&format!(
        "# setup\n\
         mkdisk -size=3000 -unit=K -path={p}\n\
         fdisk -size=300 -path={p} -name=Part1\n\
         mount -path={p} -name=Part1\n",
        p = path
    ));

    assert!(!out.contains("Error"), "{}", out);
    assert!(out.contains("781A"));

    let out = engine.run_command_line(
        "mkfs -id=781A\n\
         login -user=root -pass=123 -id=781A\n\
         mkdir -path=/docs -p\n\
         cat -file1=/docs/missing.txt",
    );

    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(!lines[..3].iter().any(|l| l.starts_with("Error")), "{}", out);
    assert!(lines[3].contains("does not exist"));

    let tree = engine.snapshot_tree("781A").unwrap();
    assert_eq!(tree.child("docs").unwrap().kind, InodeType::Folder);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_no_commands() {
    let mut engine = Engine::new(Config::default());

    assert_eq!(engine.run_command_line(""), NO_COMMANDS);
    assert_eq!(engine.run_command_line("# only a comment\n\n"), NO_COMMANDS);
}

#[test]
fn test_errors_do_not_stop_script() {
    let mut engine = Engine::new(Config::default());

    let out = engine.run_command_line("bogus -a=1\nlogout\nmounted");
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines[0].starts_with("Error: Unknown command"));
    assert_eq!(lines[1], "Error: NotLoggedIn");
    assert_eq!(lines[2], "No partitions are mounted");
}

#[test]
fn test_files_and_cat() {
    let (mut engine, path) = ready_engine("files");

    let out = engine.run_command_line(
        "mkfile -path=/a/b/c.txt -size=70 -r\n\
         cat -file2=/users.txt -file1=/a/b/c.txt -file3=/a",
    );

    assert!(!out.starts_with("Error"), "{}", out);
    assert!(out.contains(&"0123456789".repeat(7)));
    assert!(out.contains("1,G,root"));
    assert!(out.contains("Error: '/a' is a folder"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_authenticate_contract() {
    let (mut engine, path) = ready_engine("auth");

    let e = engine.authenticate("root", "123", "781A").unwrap_err();
    assert_eq!(e.kind(), Some(ErrorKind::Auth));

    engine.run_command_line("logout");
    assert!(!engine.session().is_logged_in());

    let e = engine.authenticate("root", "wrong", "781a").unwrap_err();
    assert_eq!(e.kind(), Some(ErrorKind::Auth));
    assert!(!engine.session().is_logged_in());

    engine.authenticate("root", "123", "781a").unwrap();
    assert!(engine.session().is_logged_in());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_users_and_groups() {
    let (mut engine, path) = ready_engine("users");

    let out = engine.run_command_line(
        "mkgrp -name=dev\n\
         mkusr -user=ana -pass=pw -grp=dev\n\
         mkdir -path=/secure\n\
         logout\n\
         login -user=ana -pass=pw -id=781A\n\
         mkgrp -name=ops\n\
         mkdir -path=/secure/mine\n\
         mkdir -path=/mine",
    );
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "Group 'dev' created with id 2");
    assert_eq!(lines[1], "User 'ana' created with id 2");
    assert_eq!(lines[5], "Error: RootOnly");
    assert!(lines[6].starts_with("Error: Permission denied"));
    assert_eq!(lines[7], "Folder /mine created");

    let out = engine.run_command_line(
        "logout\n\
         login -user=root -pass=123 -id=781A\n\
         rmusr -user=ana\n\
         rmgrp -name=dev\n\
         rmgrp -name=dev",
    );
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[2], "User 'ana' removed");
    assert_eq!(lines[3], "Group 'dev' removed");
    assert!(lines[4].contains("already deleted"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_mount_rules() {
    let first = disk_path("mount_a");
    let second = disk_path("mount_b");
    let mut engine = Engine::new(Config::default());

    let out = engine.run_command_line(&format!(
        "mkdisk -size=1 -path={a}\n\
         mkdisk -size=1 -path={b}\n\
         fdisk -size=100 -path={a} -name=One\n\
         fdisk -size=100 -path={a} -name=Two\n\
         fdisk -size=100 -path={b} -name=One\n\
         fdisk -size=200 -path={b} -name=Ext -type=E\n\
         mount -path={a} -name=One\n\
         mount -path={a} -name=Two\n\
         mount -path={b} -name=One\n\
         mount -path={a} -name=One\n\
         mount -path={b} -name=Ext",
        a = first,
        b = second
    ));
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines[6].ends_with("781A"));
    assert!(lines[7].ends_with("782A"));
    assert!(lines[8].ends_with("781B"));
    assert!(lines[9].contains("already mounted"));
    assert!(lines[10].contains("extended"));

    let out = engine.run_command_line("mounted");
    assert_eq!(out.lines().count(), 3);

    engine.run_command_line(&format!("rmdisk -path={}", first));
    assert_eq!(engine.registry().mounts().len(), 1);
    assert!(!std::path::Path::new(&first).exists());

    std::fs::remove_file(&second).unwrap();
}

#[test]
fn test_mkdisk_existing_file() {
    let path = disk_path("existing");
    let mut engine = Engine::new(Config::default());

    engine.run_command_line(&format!("mkdisk -size=1 -path={}", path));
    let out = engine.run_command_line(&format!("mkdisk -size=1 -path={}", path));

    assert!(out.starts_with("Error"));
    assert!(out.contains("already exists"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_snapshot_requires_mount() {
    let engine = Engine::new(Config::default());

    match engine.snapshot_tree("781A") {
        Err(CommandError::Fs(e)) => assert!(e.to_string().contains("781A")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_custom_suffix() {
    let path = disk_path("suffix");
    let mut engine = Engine::new(Config::default().with_suffix("42"));

    let out = engine.run_command_line(&format!(
        "mkdisk -size=1 -path={p}\nfdisk -size=100 -path={p} -name=One\nmount -path={p} -name=One",
        p = path
    ));

    assert!(out.ends_with("421A"), "{}", out);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_cat_has_no_blank_lines() {
    let (mut engine, path) = ready_engine("cat_lines");

    let out = engine.run_command_line(
        "mkfile -path=/a.txt -size=5\n\
         cat -file1=/users.txt -file2=/a.txt",
    );
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(
        lines,
        vec![
            "File /a.txt created (5 bytes)",
            "1,G,root",
            "1,U,root,root,123",
            "01234"
        ]
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_padded_values_rejected() {
    let (mut engine, path) = ready_engine("padded");

    let out = engine.run_command_line(
        "mkgrp -name=g\n\
         mkusr -user=ana -pass=\"pw \" -grp=g\n\
         mkgrp -name=\" dev\"\n\
         mkusr -user=ana -pass=\"p w\" -grp=g\n\
         logout\n\
         login -user=ana -pass=\"p w\" -id=781A",
    );
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines[1].starts_with("Error: Invalid name"), "{}", out);
    assert!(lines[2].starts_with("Error: Invalid name"), "{}", out);
    assert_eq!(lines[3], "User 'ana' created with id 2");
    assert_eq!(lines[5], "Welcome, ana");

    std::fs::remove_file(&path).unwrap();
}
