//! Process handles.

use std::cell::RefCell;
use std::io;
use std::process::{Child, Command, ExitStatus};
use std::rc::Rc;

/// A shared process handle.
pub type ProcessPtr = Rc<RefCell<ProcessHandle>>;

/// A spawned child process and, once reaped, its exit status.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Option<Child>,
    status: Option<ExitStatus>,
}

impl ProcessHandle {
    /// Spawns `program` with `args`.
    pub fn spawn(program: &str, args: &[&str]) -> io::Result<ProcessHandle> {
        let child = Command::new(program).args(args).spawn()?;
        Ok(ProcessHandle {
            child: Some(child),
            status: None,
        })
    }

    /// Wraps `self` in a shared handle.
    pub fn shared(self) -> ProcessPtr {
        Rc::new(RefCell::new(self))
    }

    /// OS process id while the child is still held.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Waits for the child to finish. Repeated calls return the stored status.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        match self.child.take() {
            Some(mut child) => {
                let status = child.wait()?;
                self.status = Some(status);
                Ok(status)
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no child process")),
        }
    }

    /// Exit code of a reaped child.
    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// Returns `true` while the child has not been reaped.
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }
}
