// Shared fixtures for unit tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::vocabulary::Vocabulary;

/// Write `contents` to `dir/name` and return the full path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Five-word vocabulary without embeddings:
/// a=0 b=1 c=2 d=3 e=4, then <SOS>=5 <EOS>=6 <UNK>=7 <PAD>=8.
pub fn small_vocabulary(dir: &Path) -> Arc<Vocabulary> {
    let path = write_file(dir, "vocab.txt", "5 2\na 0 0\nb 0 0\nc 0 0\nd 0 0\ne 0 0\n");
    Arc::new(Vocabulary::from_file(&path, &[], false, false, false).unwrap())
}
