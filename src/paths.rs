use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub static PATH_HOME: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(env::var("HOME").unwrap_or_else(|_| "/".to_string())));

pub static PATH_LOCAL_SHARE: LazyLock<PathBuf> = LazyLock::new(|| PATH_HOME.join(".local/share"));

pub static PATH_DATA: LazyLock<PathBuf> = LazyLock::new(|| {
    if let Ok(xdg_data_home) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join("mxlaunch");
    }
    PATH_LOCAL_SHARE.join("mxlaunch")
});

pub static LIB_MAXIMA: LazyLock<PathBuf> = LazyLock::new(|| {
    let lib_candidates = [PathBuf::from("/usr/lib"), PathBuf::from("/usr/local/lib")];
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    find_library(&lib_candidates, &exe_dir)
});

/// First existing provider library in `dirs`, else the one next to the executable
pub fn find_library(dirs: &[PathBuf], exe_dir: &Path) -> PathBuf {
    let name = libloading::library_filename("maxima");
    for candidate in dirs {
        let lib = candidate.join(&name);
        if lib.exists() {
            return lib;
        }
    }
    exe_dir.join(name)
}
