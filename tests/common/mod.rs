//! Fixture setup shared by the integration tests.

use pagesmith::config::Project;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Copy `fixtures/site/` to a temp directory and load it as a project.
pub fn site() -> (TempDir, Project) {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir(&fixtures, tmp.path());
    let project = Project::load(tmp.path()).unwrap();
    (tmp, project)
}

fn copy_dir(src: &Path, dst: &Path) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            fs::create_dir_all(&target).unwrap();
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}
