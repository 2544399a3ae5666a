// src/sync/mod.rs

//! Reconciliation pipeline
//!
//! One run goes: query installed packages, load definitions, read the managed
//! set, compute the diff, present it, confirm, apply, and finally record the
//! desired set as managed for the current host.
//!
//! Every collaborator is passed in through [`SyncContext`]; nothing here reads
//! global state.

pub mod apply;
pub mod diff;

use crate::config::Config;
use crate::definitions::DefinitionLoader;
use crate::db::ManagedStore;
use crate::display::Presenter;
use crate::error::{Error, Result};
use crate::packages::PackageManager;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub use apply::{ApplyOutcome, Confirmation, SyncOptions, TerminalPrompt, apply_diff};
pub use diff::{PackageDiff, build_desired_set, compute_diff};

/// Everything one sync run needs
pub struct SyncContext<'a> {
    pub config: &'a Config,
    /// Resolved once by the caller before anything else happens
    pub host: &'a str,
    pub package_manager: &'a dyn PackageManager,
    pub loader: &'a dyn DefinitionLoader,
    pub store: &'a mut dyn ManagedStore,
    pub presenter: &'a dyn Presenter,
    pub confirmation: &'a mut dyn Confirmation,
}

/// The computed inputs and diff of a run, before anything is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub desired: BTreeSet<String>,
    pub diff: PackageDiff,
}

/// How a sync run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    DryRun,
    NothingToDo,
    Aborted,
    /// Changes applied; `recorded` packages are now managed for the host
    Applied { recorded: usize },
}

/// Gather all inputs and compute the diff
///
/// Fails before any mutation if a source or the store cannot be read.
pub fn plan(ctx: &SyncContext) -> Result<Plan> {
    let installed: BTreeSet<String> = ctx
        .package_manager
        .list_installed()
        .map_err(|e| Error::source_read("installed packages", e))?
        .into_iter()
        .collect();

    let definitions = ctx
        .loader
        .load_all_definitions()
        .map_err(|e| match e {
            Error::SourceRead { .. } => e,
            other => Error::source_read("package definitions", other),
        })?;

    let desired = build_desired_set(&definitions, ctx.host);
    let managed = ctx.store.get_managed(ctx.host)?;
    debug!(
        "{} desired, {} installed, {} previously managed for {}",
        desired.len(),
        installed.len(),
        managed.len(),
        ctx.host
    );

    let diff = compute_diff(&desired, &installed, &managed, &ctx.config.ignore_set());
    Ok(Plan { desired, diff })
}

/// Run a full sync
pub fn run(ctx: &mut SyncContext, options: &SyncOptions) -> Result<SyncOutcome> {
    let Plan { desired, diff } = plan(ctx)?;

    ctx.presenter.render(&diff, options.strict)?;

    if options.dry_run {
        info!("Dry run, no changes made");
        return Ok(SyncOutcome::DryRun);
    }

    match apply_diff(&diff, options, ctx.package_manager, ctx.confirmation)? {
        ApplyOutcome::NothingToDo => Ok(SyncOutcome::NothingToDo),
        ApplyOutcome::Aborted => Ok(SyncOutcome::Aborted),
        ApplyOutcome::Applied => {
            ctx.store
                .replace_managed(ctx.host, &desired)
                .map_err(|e| Error::Commit(Box::new(e)))?;
            info!("Recorded {} managed package(s) for {}", desired.len(), ctx.host);
            Ok(SyncOutcome::Applied {
                recorded: desired.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::apply::testing::{FakePackageManager, FixedAnswer};
    use super::*;
    use crate::db::SqliteStore;
    use crate::definitions::Definition;
    use rusqlite::Connection;

    struct StaticLoader(Vec<Definition>);

    impl DefinitionLoader for StaticLoader {
        fn load_all_definitions(&self) -> Result<Vec<Definition>> {
            Ok(self.0.clone())
        }
    }

    struct FailingLoader;

    impl DefinitionLoader for FailingLoader {
        fn load_all_definitions(&self) -> Result<Vec<Definition>> {
            Err(Error::Io(std::io::Error::other("permission denied")))
        }
    }

    /// Store whose reads or writes fail on demand
    struct BrokenStore {
        managed: BTreeSet<String>,
        fail_read: bool,
    }

    impl BrokenStore {
        fn failure() -> Error {
            Error::Persistence(rusqlite::Error::InvalidQuery)
        }
    }

    impl ManagedStore for BrokenStore {
        fn get_managed(&self, _host: &str) -> Result<BTreeSet<String>> {
            if self.fail_read {
                return Err(Self::failure());
            }
            Ok(self.managed.clone())
        }

        fn replace_managed(&mut self, _host: &str, _packages: &BTreeSet<String>) -> Result<()> {
            Err(Self::failure())
        }
    }

    struct Silent;

    impl Presenter for Silent {
        fn render(&self, _diff: &PackageDiff, _strict: bool) -> Result<()> {
            Ok(())
        }
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn global(names: &[&str]) -> Definition {
        Definition {
            packages: names.iter().map(|s| s.to_string()).collect(),
            host: None,
        }
    }

    fn memory_store() -> SqliteStore {
        SqliteStore::from_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_dry_run_leaves_store_untouched() {
        let config = Config::default();
        let pm = FakePackageManager::with_installed(&["vim", "htop"]);
        let loader = StaticLoader(vec![global(&["vim", "git"])]);
        let mut store = memory_store();
        store.replace_managed("box", &set(&["htop"])).unwrap();
        let mut confirm = FixedAnswer::new(true);

        let before = store.get_managed("box").unwrap();
        let outcome = {
            let mut ctx = SyncContext {
                config: &config,
                host: "box",
                package_manager: &pm,
                loader: &loader,
                store: &mut store,
                presenter: &Silent,
                confirmation: &mut confirm,
            };
            let options = SyncOptions {
                dry_run: true,
                ..SyncOptions::default()
            };
            run(&mut ctx, &options).unwrap()
        };

        assert_eq!(outcome, SyncOutcome::DryRun);
        assert_eq!(confirm.asked, 0);
        assert!(pm.calls.borrow().is_empty());
        assert_eq!(store.get_managed("box").unwrap(), before);
    }

    #[test]
    fn test_apply_records_desired_set() {
        let config = Config::default();
        let pm = FakePackageManager::with_installed(&["vim", "htop"]);
        let loader = StaticLoader(vec![
            global(&["vim", "git"]),
            Definition {
                packages: vec!["steam".to_string()],
                host: Some("other".to_string()),
            },
        ]);
        let mut store = memory_store();
        store.replace_managed("box", &set(&["htop"])).unwrap();
        let mut confirm = FixedAnswer::new(true);

        let outcome = {
            let mut ctx = SyncContext {
                config: &config,
                host: "box",
                package_manager: &pm,
                loader: &loader,
                store: &mut store,
                presenter: &Silent,
                confirmation: &mut confirm,
            };
            run(&mut ctx, &SyncOptions::default()).unwrap()
        };

        assert_eq!(outcome, SyncOutcome::Applied { recorded: 2 });
        assert_eq!(store.get_managed("box").unwrap(), set(&["git", "vim"]));
        let calls = pm.calls.borrow();
        assert_eq!(calls[0].0, "install");
        assert_eq!(calls[0].1, vec!["git".to_string()]);
        assert_eq!(calls[1].0, "remove");
        assert_eq!(calls[1].1, vec!["htop".to_string()]);
    }

    #[test]
    fn test_failed_apply_does_not_touch_store() {
        let config = Config::default();
        let pm = FakePackageManager {
            installed: vec!["htop".to_string()],
            fail_on: Some("install"),
            ..FakePackageManager::default()
        };
        let loader = StaticLoader(vec![global(&["git"])]);
        let mut store = memory_store();
        store.replace_managed("box", &set(&["htop"])).unwrap();
        let mut confirm = FixedAnswer::new(true);

        let result = {
            let mut ctx = SyncContext {
                config: &config,
                host: "box",
                package_manager: &pm,
                loader: &loader,
                store: &mut store,
                presenter: &Silent,
                confirmation: &mut confirm,
            };
            run(&mut ctx, &SyncOptions::default())
        };

        assert!(matches!(result, Err(Error::Apply { step: "install", .. })));
        assert_eq!(store.get_managed("box").unwrap(), set(&["htop"]));
    }

    #[test]
    fn test_aborted_run_does_not_touch_store() {
        let config = Config::default();
        let pm = FakePackageManager::with_installed(&[]);
        let loader = StaticLoader(vec![global(&["git"])]);
        let mut store = memory_store();
        let mut confirm = FixedAnswer::new(false);

        let outcome = {
            let mut ctx = SyncContext {
                config: &config,
                host: "box",
                package_manager: &pm,
                loader: &loader,
                store: &mut store,
                presenter: &Silent,
                confirmation: &mut confirm,
            };
            run(&mut ctx, &SyncOptions::default()).unwrap()
        };

        assert_eq!(outcome, SyncOutcome::Aborted);
        assert!(store.get_managed("box").unwrap().is_empty());
    }

    #[test]
    fn test_ignore_list_comes_from_config() {
        let config = Config {
            uninstall_ignore: vec!["foo".to_string()],
            ..Config::default()
        };
        let pm = FakePackageManager::with_installed(&["foo"]);
        let loader = StaticLoader(vec![]);
        let mut store = memory_store();
        store.replace_managed("box", &set(&["foo"])).unwrap();
        let mut confirm = FixedAnswer::new(true);

        let ctx = SyncContext {
            config: &config,
            host: "box",
            package_manager: &pm,
            loader: &loader,
            store: &mut store,
            presenter: &Silent,
            confirmation: &mut confirm,
        };
        let plan = plan(&ctx).unwrap();

        assert_eq!(plan.diff, PackageDiff::default());
    }

    #[test]
    fn test_loader_failure_is_source_read() {
        let config = Config::default();
        let pm = FakePackageManager::with_installed(&["vim"]);
        let mut store = memory_store();
        let mut confirm = FixedAnswer::new(true);

        let ctx = SyncContext {
            config: &config,
            host: "box",
            package_manager: &pm,
            loader: &FailingLoader,
            store: &mut store,
            presenter: &Silent,
            confirmation: &mut confirm,
        };

        match plan(&ctx) {
            Err(Error::SourceRead { stage, .. }) => assert_eq!(stage, "package definitions"),
            other => panic!("expected source read error, got {:?}", other),
        }
    }

    #[test]
    fn test_store_write_failure_after_apply_is_commit_error() {
        let config = Config::default();
        let pm = FakePackageManager::with_installed(&[]);
        let loader = StaticLoader(vec![global(&["git"])]);
        let mut store = BrokenStore {
            managed: BTreeSet::new(),
            fail_read: false,
        };
        let mut confirm = FixedAnswer::new(true);

        let result = {
            let mut ctx = SyncContext {
                config: &config,
                host: "box",
                package_manager: &pm,
                loader: &loader,
                store: &mut store,
                presenter: &Silent,
                confirmation: &mut confirm,
            };
            run(&mut ctx, &SyncOptions::default())
        };

        match result {
            Err(Error::Commit(inner)) => assert!(matches!(*inner, Error::Persistence(_))),
            other => panic!("expected commit error, got {:?}", other),
        }
        let calls = pm.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "install");
        assert_eq!(calls[0].1, vec!["git".to_string()]);
    }

    #[test]
    fn test_store_read_failure_stops_before_any_change() {
        let config = Config::default();
        let pm = FakePackageManager::with_installed(&["htop"]);
        let loader = StaticLoader(vec![global(&["git"])]);
        let mut store = BrokenStore {
            managed: BTreeSet::new(),
            fail_read: true,
        };
        let mut confirm = FixedAnswer::new(true);

        let result = {
            let mut ctx = SyncContext {
                config: &config,
                host: "box",
                package_manager: &pm,
                loader: &loader,
                store: &mut store,
                presenter: &Silent,
                confirmation: &mut confirm,
            };
            run(&mut ctx, &SyncOptions::default())
        };

        assert!(matches!(result, Err(Error::Persistence(_))));
        assert!(pm.calls.borrow().is_empty());
        assert_eq!(confirm.asked, 0);
    }
}
