//! Shared helpers for CLI tests

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Index runs copy stdin into the -f file, merges concatenate the inputs
// into the last argument, and searches echo one hit per query word.
const FAKE_SWISH: &str = r#"#!/bin/sh
mode=index
out=""
query=""
prev=""
last=""
for arg in "$@"; do
  if [ "$prev" = "-f" ]; then out="$arg"; fi
  if [ "$prev" = "-w" ]; then query="$arg"; mode=search; fi
  if [ "$arg" = "-M" ]; then mode=merge; fi
  prev="$arg"
  last="$arg"
done

if [ "$mode" = search ]; then
  if [ "$query" = "nothing" ]; then
    echo "err: no results"
    exit 0
  fi
  printf '1000\tdocs/%s.html\tAbout %s\t321\n' "$query" "$query"
  printf '500\tdocs/other.html\t\t12\n'
  exit 0
fi

if [ "$mode" = merge ]; then
  inputs=""
  collecting=0
  for arg in "$@"; do
    if [ "$collecting" = 1 ] && [ "$arg" != "$last" ]; then inputs="$inputs $arg"; fi
    if [ "$arg" = "-M" ]; then collecting=1; fi
  done
  : > "$last"
  for f in $inputs; do cat "$f" >> "$last"; done
  printf merged > "$last.prop"
  exit 0
fi

cat > "$out"
printf props > "$out.prop"
if [ ! -s "$out" ]; then exit 1; fi
exit 0
"#;

/// A scratch directory holding a stand-in `swish-e`
pub struct Workspace {
    pub dir: TempDir,
    pub program: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let program = dir.path().join("swish-e");
        fs::write(&program, FAKE_SWISH).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, program }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// `indexfeed` with the fake indexer and no user config
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("indexfeed").unwrap();
        cmd.env("INDEXFEED_SWISH_BIN", &self.program)
            .env("INDEXFEED_CONFIG", self.join("no-config.yml"))
            .env_remove("RUST_LOG")
            .env_remove("SWISH3")
            .env_remove("INDEXFEED_DEBUG");
        cmd
    }
}
