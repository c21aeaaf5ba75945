//! Shared helpers: a stand-in `swish-e` script
//!
//! Index runs copy stdin into the `-f` file (exit 1 when stdin is empty).
//! Merges concatenate the `-M` inputs into the last argument. Every
//! invocation is appended to `calls.log` beside the script.

#![allow(dead_code)]

use indexfeed_core::IndexerConfig;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const FAKE_SWISH: &str = r#"#!/bin/sh
echo "$*" >> "__LOG__"
mode=index
out=""
prev=""
last=""
for arg in "$@"; do
  if [ "$prev" = "-f" ]; then out="$arg"; fi
  if [ "$arg" = "-M" ]; then mode=merge; fi
  prev="$arg"
  last="$arg"
done

if [ "$mode" = merge ]; then
  if [ "__FAIL__" = "1" ]; then
    echo "merge failed" >&2
    printf partial > "$last"
    exit 2
  fi
  inputs=""
  collecting=0
  for arg in "$@"; do
    if [ "$collecting" = 1 ] && [ "$arg" != "$last" ]; then inputs="$inputs $arg"; fi
    if [ "$arg" = "-M" ]; then collecting=1; fi
  done
  : > "$last"
  for f in $inputs; do cat "$f" >> "$last"; done
  if [ "__PROPS__" = "1" ]; then printf merged > "$last.prop"; fi
  echo "Merged $inputs"
  exit 0
fi

cat > "$out"
printf props > "$out.prop"
if [ "__FAIL__" = "1" ]; then exit 2; fi
if [ ! -s "$out" ]; then exit 1; fi
exit 0
"#;

pub struct FakeSwish {
    pub program: PathBuf,
    pub log: PathBuf,
}

impl FakeSwish {
    pub fn install(dir: &Path, fail: bool) -> Self {
        let name = if fail { "swish-e-failing" } else { "swish-e" };
        Self::install_script(dir, name, fail, true)
    }

    /// Merges exit 0 but never write the `.prop` file
    pub fn install_without_merge_props(dir: &Path) -> Self {
        Self::install_script(dir, "swish-e-no-props", false, false)
    }

    fn install_script(dir: &Path, name: &str, fail: bool, props: bool) -> Self {
        let program = dir.join(name);
        let log = dir.join("calls.log");
        let script = FAKE_SWISH
            .replace("__LOG__", &log.display().to_string())
            .replace("__FAIL__", if fail { "1" } else { "0" })
            .replace("__PROPS__", if props { "1" } else { "0" });
        fs::write(&program, script).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        Self { program, log }
    }

    pub fn config(&self) -> IndexerConfig {
        IndexerConfig {
            program: Some(self.program.clone()),
            debug: false,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Names of everything directly inside `dir`, sorted
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
