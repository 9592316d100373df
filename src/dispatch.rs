// src/dispatch.rs

//! Runtime side of a multi-call binary
//!
//! The generated aggregator main builds a [`Registry`], lets every embedded
//! program register itself, then calls [`Registry::run`]. The program to run
//! is picked from the name the binary was invoked under (`argv[0]`), the
//! BusyBox way:
//!
//! - a registered name runs that program
//! - the binary's own file name recreates one symlink per registered name
//!   in the current directory
//! - anything else is an error listing the registered names

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitCode, Termination};
use tracing::{debug, warn};

/// Entry point of one embedded program
pub type AppMain = Box<dyn Fn() -> ExitCode + Send + Sync>;

/// What a dispatch did
#[derive(Debug)]
pub enum Dispatch {
    /// A registered program ran and returned this code
    Ran { app: String, code: ExitCode },
    /// Invoked under the binary's own name: symlinks were (re)created
    Linked { links: Vec<PathBuf> },
}

/// Invocation name to entry point mapping
#[derive(Default)]
pub struct Registry {
    apps: BTreeMap<String, AppMain>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program under an invocation name
    ///
    /// Anything a `main` function may return is accepted. Registering a
    /// name twice keeps the latest entry.
    pub fn add<F, T>(&mut self, name: impl Into<String>, main: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Termination,
    {
        let name = name.into();
        if self.apps.contains_key(&name) {
            warn!("App {} registered twice, keeping the latest", name);
        }
        self.apps.insert(name, Box::new(move || main().report()));
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.apps.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Pick and run a program
    ///
    /// `argv0` is the name the process was invoked under, `exe` the real
    /// executable (symlinks are resolved here) and `link_dir` where symlinks
    /// go when invoked under the executable's own name.
    pub fn dispatch(&self, argv0: &OsStr, exe: &Path, link_dir: &Path) -> Result<Dispatch> {
        let process_file = exe.canonicalize().map_err(|e| Error::io(exe, e))?;
        let app_name = Path::new(argv0)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root_name = process_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Dispatching {} (binary {})", app_name, process_file.display());

        if let Some(main) = self.apps.get(&app_name) {
            let code = main();
            return Ok(Dispatch::Ran { app: app_name, code });
        }

        if app_name == root_name {
            let links = self.link_all(&process_file, link_dir)?;
            return Ok(Dispatch::Linked { links });
        }

        Err(Error::UnknownApp {
            name: app_name,
            registered: self.apps.keys().cloned().collect(),
        })
    }

    /// Dispatch the current process and turn the outcome into an exit code
    pub fn run(&self) -> ExitCode {
        let argv0 = std::env::args_os().next().unwrap_or_default();
        let outcome = std::env::current_exe()
            .map_err(|e| Error::io(Path::new(&argv0), e))
            .and_then(|exe| {
                let link_dir = std::env::current_dir().map_err(|e| Error::io(".", e))?;
                self.dispatch(&argv0, &exe, &link_dir)
            });

        match outcome {
            Ok(Dispatch::Ran { code, .. }) => code,
            Ok(Dispatch::Linked { links }) => {
                println!("Rebuilt {} symlink(s) in current directory:", links.len());
                for link in &links {
                    println!(" {}", link.display());
                }
                ExitCode::SUCCESS
            }
            Err(e @ Error::UnknownApp { .. }) => {
                eprintln!("{}", e);
                ExitCode::from(2)
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        }
    }

    /// One `link_dir/<name> -> process_file` symlink per registered name;
    /// existing symlinks are replaced, other files are left alone
    fn link_all(&self, process_file: &Path, link_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut links = Vec::with_capacity(self.apps.len());
        for name in self.apps.keys() {
            let link = link_dir.join(name);
            if let Ok(meta) = link.symlink_metadata() {
                if !meta.file_type().is_symlink() {
                    warn!("Not replacing {}: not a symlink", link.display());
                    continue;
                }
                std::fs::remove_file(&link).map_err(|e| Error::io(&link, e))?;
            }
            symlink(process_file, &link).map_err(|e| Error::io(&link, e))?;
            debug!("Linked {} -> {}", link.display(), process_file.display());
            links.push(link);
        }
        Ok(links)
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are only supported on unix",
    ))
}
