//! The external queue tools and the actions that run them.
//!
//! Everything that touches the live queue goes through [`QueueBackend`], so
//! the session can be driven against a scripted backend in tests.

use core::fmt::{self, Display, Formatter};
use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::{debug, warn};

use crate::{
    config::ToolPaths,
    error::{Error, Result},
};

/// Executables the console depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Lists the queue
    Postqueue,
    /// Holds, releases, requeues and deletes messages
    Postsuper,
    /// Prints a queued message
    Postcat,
}

impl Tool {
    pub const ALL: [Self; 3] = [Self::Postqueue, Self::Postsuper, Self::Postcat];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postqueue => "postqueue",
            Self::Postsuper => "postsuper",
            Self::Postcat => "postcat",
        }
    }
}

impl Display for Tool {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the operator can do with a selected message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Hold,
    Unhold,
    Requeue,
    Delete,
    Quit,
}

impl Action {
    /// Menu order
    pub const ALL: [Self; 6] = [
        Self::Read,
        Self::Hold,
        Self::Unhold,
        Self::Requeue,
        Self::Delete,
        Self::Quit,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Hold => "Hold",
            Self::Unhold => "Unhold",
            Self::Requeue => "Requeue",
            Self::Delete => "Delete",
            Self::Quit => "Quit",
        }
    }

    /// Tool and flag that carry out this action, `None` for [`Action::Quit`]
    #[must_use]
    pub const fn invocation(self) -> Option<(Tool, &'static str)> {
        match self {
            Self::Read => Some((Tool::Postcat, "-q")),
            Self::Hold => Some((Tool::Postsuper, "-h")),
            Self::Unhold => Some((Tool::Postsuper, "-H")),
            Self::Requeue => Some((Tool::Postsuper, "-r")),
            Self::Delete => Some((Tool::Postsuper, "-d")),
            Self::Quit => None,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Access to the live queue
pub trait QueueBackend {
    /// Raw machine-readable listing of the whole queue
    ///
    /// # Errors
    ///
    /// Fails when the listing tool cannot be run or exits unsuccessfully.
    fn list(&self) -> Result<String>;

    /// Run `action` against the message `queue_id`, returning what the tool
    /// printed
    ///
    /// # Errors
    ///
    /// Fails when the tool cannot be run or exits unsuccessfully, and for
    /// actions that have no tool behind them.
    fn dispatch(&self, action: Action, queue_id: &str) -> Result<String>;
}

/// Postfix command-line tools resolved to absolute paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostfixTools {
    postqueue: PathBuf,
    postsuper: PathBuf,
    postcat: PathBuf,
}

impl PostfixTools {
    /// Use the given executables without checking them
    #[must_use]
    pub const fn new(postqueue: PathBuf, postsuper: PathBuf, postcat: PathBuf) -> Self {
        Self {
            postqueue,
            postsuper,
            postcat,
        }
    }

    /// Resolve every tool once.
    ///
    /// A configured path is used as given and must point at a file; any
    /// tool without one is searched for on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] for the first tool that cannot be
    /// resolved.
    pub fn discover(paths: &ToolPaths) -> Result<Self> {
        let search = std::env::var_os("PATH").unwrap_or_default();
        let dirs: Vec<PathBuf> = std::env::split_paths(&search).collect();

        Self::discover_in(paths, &dirs)
    }

    /// [`PostfixTools::discover`] with an explicit search path
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] for the first tool that cannot be
    /// resolved.
    pub fn discover_in(paths: &ToolPaths, dirs: &[PathBuf]) -> Result<Self> {
        let resolve = |tool: Tool| -> Result<PathBuf> {
            let path = match paths.get(tool) {
                Some(configured) if configured.is_file() => configured.to_path_buf(),
                Some(configured) => {
                    return Err(Error::ToolNotFound {
                        tool: tool.name(),
                        reason: format!("{} is not a file", configured.display()),
                    });
                }
                None => find_executable(tool.name(), dirs).ok_or_else(|| Error::ToolNotFound {
                    tool: tool.name(),
                    reason: "executable file not found in $PATH".to_string(),
                })?,
            };

            debug!(tool = tool.name(), path = %path.display(), "Resolved queue tool");
            Ok(path)
        };

        Ok(Self {
            postqueue: resolve(Tool::Postqueue)?,
            postsuper: resolve(Tool::Postsuper)?,
            postcat: resolve(Tool::Postcat)?,
        })
    }

    #[must_use]
    pub fn path(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Postqueue => &self.postqueue,
            Tool::Postsuper => &self.postsuper,
            Tool::Postcat => &self.postcat,
        }
    }
}

impl QueueBackend for PostfixTools {
    fn list(&self) -> Result<String> {
        let tool = Tool::Postqueue;
        debug!(tool = tool.name(), "Listing queue");

        let output = Command::new(self.path(tool))
            .arg("-j")
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| Error::execution_failed(tool.name(), None, e.to_string()))?;

        if !output.status.success() {
            return Err(Error::execution_failed(
                tool.name(),
                Some(output.status),
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn dispatch(&self, action: Action, queue_id: &str) -> Result<String> {
        let (tool, flag) = action
            .invocation()
            .ok_or(Error::NothingToDispatch(action.label()))?;

        debug!(tool = tool.name(), flag, queue_id, "Dispatching {action}");

        let not_started =
            |e: std::io::Error| Error::execution_failed(tool.name(), None, e.to_string());

        // Both streams share one pipe so the output keeps the order it was written in
        let (mut reader, writer) = std::io::pipe().map_err(not_started)?;
        let mut child = {
            let mut command = Command::new(self.path(tool));
            command
                .arg(flag)
                .arg(queue_id)
                .stdin(Stdio::null())
                .stdout(writer.try_clone().map_err(not_started)?)
                .stderr(writer);
            command.spawn().map_err(not_started)?
        };

        // The command held the last write ends, so EOF arrives once the tool exits
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let status = child.wait()?;
        let combined = String::from_utf8_lossy(&raw).into_owned();

        if !status.success() {
            warn!(tool = tool.name(), %status, queue_id, "{action} failed");
            return Err(Error::execution_failed(tool.name(), Some(status), combined));
        }

        Ok(combined)
    }
}

fn find_executable(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn action_menu_order() {
        let labels: Vec<_> = Action::ALL.iter().map(|a| a.label()).collect();
        assert_eq!(
            labels,
            vec!["Read", "Hold", "Unhold", "Requeue", "Delete", "Quit"]
        );
    }

    #[test]
    fn action_invocations() {
        assert_eq!(Action::Read.invocation(), Some((Tool::Postcat, "-q")));
        assert_eq!(Action::Hold.invocation(), Some((Tool::Postsuper, "-h")));
        assert_eq!(Action::Unhold.invocation(), Some((Tool::Postsuper, "-H")));
        assert_eq!(Action::Requeue.invocation(), Some((Tool::Postsuper, "-r")));
        assert_eq!(Action::Delete.invocation(), Some((Tool::Postsuper, "-d")));
        assert_eq!(Action::Quit.invocation(), None);
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str, mode: u32) -> PathBuf {
        script(dir, name, mode, "")
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, mode: u32, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    #[cfg(unix)]
    fn discovers_tools_on_search_path() {
        let empty = tempfile::tempdir().unwrap();
        let sbin = tempfile::tempdir().unwrap();
        for tool in Tool::ALL {
            fake_tool(sbin.path(), tool.name(), 0o755);
        }

        let dirs = vec![empty.path().to_path_buf(), sbin.path().to_path_buf()];
        let tools = PostfixTools::discover_in(&ToolPaths::default(), &dirs).unwrap();

        for tool in Tool::ALL {
            assert_eq!(tools.path(tool), sbin.path().join(tool.name()));
        }
    }

    #[test]
    #[cfg(unix)]
    fn skips_files_that_are_not_executable() {
        let sbin = tempfile::tempdir().unwrap();
        fake_tool(sbin.path(), "postqueue", 0o644);

        let err = PostfixTools::discover_in(&ToolPaths::default(), &[sbin.path().to_path_buf()])
            .unwrap_err();

        assert!(matches!(err, Error::ToolNotFound { tool: "postqueue", .. }));
    }

    #[test]
    #[cfg(unix)]
    fn configured_paths_take_precedence() {
        let sbin = tempfile::tempdir().unwrap();
        let custom = tempfile::tempdir().unwrap();
        for tool in Tool::ALL {
            fake_tool(sbin.path(), tool.name(), 0o755);
        }
        let postcat = fake_tool(custom.path(), "postcat-3.8", 0o755);

        let paths = ToolPaths {
            postcat: Some(postcat.clone()),
            ..ToolPaths::default()
        };
        let tools = PostfixTools::discover_in(&paths, &[sbin.path().to_path_buf()]).unwrap();

        assert_eq!(tools.path(Tool::Postcat), postcat);
        assert_eq!(tools.path(Tool::Postsuper), sbin.path().join("postsuper"));
    }

    #[test]
    fn missing_configured_path_is_reported() {
        let paths = ToolPaths {
            postqueue: Some(PathBuf::from("/nonexistent/postqueue")),
            ..ToolPaths::default()
        };

        match PostfixTools::discover_in(&paths, &[]) {
            Err(Error::ToolNotFound { tool, reason }) => {
                assert_eq!(tool, "postqueue");
                assert_eq!(reason, "/nonexistent/postqueue is not a file");
            }
            other => panic!("expected a missing tool, got {other:?}"),
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn dispatch_passes_flag_then_queue_id() {
        let echo = PathBuf::from("/bin/echo");
        let tools = PostfixTools::new(echo.clone(), echo.clone(), echo);

        assert_eq!(tools.dispatch(Action::Delete, "ABC123").unwrap(), "-d ABC123\n");
        assert_eq!(tools.dispatch(Action::Read, "ABC123").unwrap(), "-q ABC123\n");
        assert_eq!(tools.list().unwrap(), "-j\n");
    }

    #[test]
    #[cfg(unix)]
    fn dispatch_output_keeps_write_order_across_streams() {
        let dir = tempfile::tempdir().unwrap();
        let postsuper = script(
            dir.path(),
            "postsuper",
            0o755,
            "echo \"postsuper: $2: placed on hold\" >&2\necho \"1 message\"\n",
        );
        let tools = PostfixTools::new(postsuper.clone(), postsuper.clone(), postsuper);

        assert_eq!(
            tools.dispatch(Action::Hold, "ABC123").unwrap(),
            "postsuper: ABC123: placed on hold\n1 message\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn failed_dispatch_carries_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let postsuper = script(
            dir.path(),
            "postsuper",
            0o755,
            "echo partial\necho \"postsuper: fatal: $2: no such message\" >&2\nexit 1\n",
        );
        let tools = PostfixTools::new(postsuper.clone(), postsuper.clone(), postsuper);

        match tools.dispatch(Action::Delete, "GONE1") {
            Err(Error::ToolExecutionFailed { tool, output, .. }) => {
                assert_eq!(tool, "postsuper");
                assert_eq!(output, "partial\npostsuper: fatal: GONE1: no such message\n");
            }
            other => panic!("expected a failed dispatch, got {other:?}"),
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn failing_tool_is_fatal() {
        let fail = PathBuf::from("/bin/false");
        let tools = PostfixTools::new(fail.clone(), fail.clone(), fail);

        assert!(matches!(
            tools.dispatch(Action::Hold, "ABC123"),
            Err(Error::ToolExecutionFailed { tool: "postsuper", .. })
        ));
        assert!(matches!(
            tools.list(),
            Err(Error::ToolExecutionFailed { tool: "postqueue", .. })
        ));
    }

    #[test]
    fn quit_has_nothing_to_dispatch() {
        let tools = PostfixTools::new(
            PathBuf::from("/nonexistent"),
            PathBuf::from("/nonexistent"),
            PathBuf::from("/nonexistent"),
        );

        assert!(matches!(
            tools.dispatch(Action::Quit, "ABC123"),
            Err(Error::NothingToDispatch("Quit"))
        ));
    }

    #[test]
    fn unstartable_tool_is_fatal() {
        let tools = PostfixTools::new(
            PathBuf::from("/nonexistent/postqueue"),
            PathBuf::from("/nonexistent/postsuper"),
            PathBuf::from("/nonexistent/postcat"),
        );

        let err = tools.dispatch(Action::Requeue, "ABC123").unwrap_err();
        assert!(err.to_string().contains("not started"));
    }
}
