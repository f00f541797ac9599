//! Run the current file: find its project root, build a command for it and
//! stream the command's output into a reusable surface.

mod compiler;
mod filetype;
mod recipe;
mod root;
mod session;
pub mod shell;
pub mod system;

use std::path::{Path, PathBuf};

pub use filetype::FileType;
pub use recipe::{Recipe, RunPlan, synthesize};
pub use root::{RootResolver, containing_dir};
pub use session::{RunId, Session, SessionEvent};
pub use system::{OsSystem, System};

use crate::config::Settings;
use crate::error::RunnerError;
use crate::host::{Host, NotifyLevel, OutputStream, SplitSpec, SurfaceId};

/// Everything needed to run one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub file: PathBuf,
    pub filetype: FileType,
    /// Raw, unquoted argument string as the user typed it
    pub extra_args: String,
    /// Skip root detection and use this directory
    pub explicit_root: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(file: impl Into<PathBuf>, filetype: FileType) -> Self {
        Self {
            file: file.into(),
            filetype,
            extra_args: String::new(),
            explicit_root: None,
        }
    }

    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.extra_args = args.into();
        self
    }

    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        self.explicit_root = root;
        self
    }

    /// Request for the host's active document
    pub fn from_host<H: Host + ?Sized>(host: &H, extra_args: &str) -> Result<Self, RunnerError> {
        let file = host.active_file().ok_or(RunnerError::NoActiveFile)?;
        Ok(Self::new(file, host.active_filetype()).with_args(extra_args))
    }
}

/// What `Runner::run` did
#[derive(Debug)]
pub enum RunOutcome {
    Started { run: RunId, surface: SurfaceId },
    NoRecipe(FileType),
    Failed(RunnerError),
}

/// Ties root resolution, synthesis and the session together
pub struct Runner<S: System = OsSystem> {
    settings: Settings,
    system: S,
}

impl Runner<OsSystem> {
    pub fn with_os(settings: Settings) -> Self {
        Self::new(settings, OsSystem)
    }
}

impl<S: System> Runner<S> {
    pub fn new(settings: Settings, system: S) -> Self {
        Self { settings, system }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn split_spec(&self) -> SplitSpec {
        SplitSpec {
            edge: self.settings.split_edge,
            size: self.settings.split_height,
        }
    }

    pub fn resolve_root(&self, request: &RunRequest) -> PathBuf {
        match &request.explicit_root {
            Some(root) => root.clone(),
            None => RootResolver::new(&self.system, &self.settings.markers).resolve(&request.file),
        }
    }

    /// Root and recipe for a request, without touching the host
    pub fn plan(&self, request: &RunRequest) -> (PathBuf, Recipe) {
        let root = self.resolve_root(request);
        let recipe = synthesize(
            &self.settings,
            &self.system,
            &request.filetype,
            &root,
            &request.file,
            &request.extra_args,
        );
        (root, recipe)
    }

    /// Run the host's active document
    pub fn run_active<H: Host + ?Sized>(
        &self,
        host: &mut H,
        session: &mut Session,
        extra_args: &str,
        explicit_root: Option<&Path>,
    ) -> RunOutcome {
        match RunRequest::from_host(host, extra_args) {
            Ok(request) => {
                let request = request.with_root(explicit_root.map(Path::to_path_buf));
                self.run(host, session, &request)
            }
            Err(e) => {
                host.notify(NotifyLevel::Error, &format!("quickrun: {}", e));
                RunOutcome::Failed(e)
            }
        }
    }

    /// Resolve, synthesize, save, open the surface and spawn.
    ///
    /// Never fails outright: every problem is also reported through
    /// `host.notify`.
    pub fn run<H: Host + ?Sized>(
        &self,
        host: &mut H,
        session: &mut Session,
        request: &RunRequest,
    ) -> RunOutcome {
        let (root, recipe) = self.plan(request);

        let plan = match recipe {
            Recipe::Plan(plan) => plan,
            Recipe::NoRecipe(filetype) => {
                tracing::warn!("no recipe for {} ({})", request.file.display(), filetype);
                host.notify(
                    NotifyLevel::Warn,
                    &format!("quickrun: no recipe for filetype '{}'", filetype),
                );
                return RunOutcome::NoRecipe(filetype);
            }
        };
        tracing::debug!(root = %root.display(), "plan: {}", plan.shell_command);

        // Saved before the split opens, while the document still has focus
        if let Err(e) = host.save_active_document() {
            let err = RunnerError::Save(e);
            tracing::warn!("{}", err);
            host.notify(NotifyLevel::Error, &format!("quickrun: {}", err));
            return RunOutcome::Failed(err);
        }

        let cwd = self.working_directory(&plan, &request.file);
        let surface = session.ensure_surface(host, self.split_spec());

        match session.spawn(&plan, &cwd, surface) {
            Ok(run) => RunOutcome::Started { run, surface },
            Err(e) => {
                tracing::error!("{}", e);
                host.append_output(surface, OutputStream::Stderr, &e.to_string());
                host.notify(NotifyLevel::Error, &format!("quickrun: {}", e));
                RunOutcome::Failed(e)
            }
        }
    }

    fn working_directory(&self, plan: &RunPlan, file: &Path) -> PathBuf {
        if self.system.is_dir(&plan.working_directory) {
            plan.working_directory.clone()
        } else {
            containing_dir(file)
        }
    }

    /// Apply one session event to the host. Returns the exit code for
    /// `Exited` events.
    pub fn handle_event<H: Host + ?Sized>(&self, host: &mut H, event: SessionEvent) -> Option<i32> {
        match event {
            SessionEvent::Output {
                surface,
                stream,
                line,
                ..
            } => {
                if host.surface_is_valid(surface) {
                    host.append_output(surface, stream, &line);
                }
                None
            }
            SessionEvent::Exited { run, surface, code } => {
                tracing::info!(run, code, "process exited");
                if host.surface_is_valid(surface) {
                    host.append_output(
                        surface,
                        OutputStream::Stdout,
                        &format!("[process exited {}]", code),
                    );
                }
                if code == 0 {
                    host.notify(NotifyLevel::Info, "quickrun: finished");
                } else {
                    host.notify(
                        NotifyLevel::Error,
                        &format!("quickrun: exited with code {}", code),
                    );
                }
                Some(code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FakeHost;
    use crate::runner::system::FakeSystem;
    use std::fs;
    use tempfile::TempDir;

    fn runner(system: FakeSystem) -> Runner<FakeSystem> {
        let settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        Runner::new(settings, system)
    }

    /// Feed events to the host until `run` exits
    async fn finish<S: System>(
        runner: &Runner<S>,
        host: &mut FakeHost,
        session: &mut Session,
        run: RunId,
    ) -> i32 {
        loop {
            let event = session.next_event().await.expect("channel open");
            let done = matches!(event, SessionEvent::Exited { run: r, .. } if r == run);
            let code = runner.handle_event(host, event);
            if done {
                return code.expect("exit code");
            }
        }
    }

    #[test]
    fn repo_with_makefile_and_cmake_uses_make() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        fs::create_dir_all(repo.join("src")).unwrap();
        fs::write(repo.join("Makefile"), "run:\n").unwrap();
        fs::write(repo.join("CMakeLists.txt"), "").unwrap();
        fs::write(repo.join("src/main.cpp"), "").unwrap();

        let runner = runner(FakeSystem::new().with_vcs_root(&repo));
        let request = RunRequest::new(repo.join("src/main.cpp"), FileType::Cpp);
        let (root, recipe) = runner.plan(&request);

        assert_eq!(root, repo);
        match recipe {
            Recipe::Plan(plan) => {
                assert_eq!(plan.shell_command, "make run || make");
                assert_eq!(plan.working_directory, repo);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn explicit_root_skips_detection() {
        let runner = runner(FakeSystem::new().with_vcs_root("/somewhere"));
        let request = RunRequest::new("/somewhere/a.py", FileType::Python)
            .with_root(Some(PathBuf::from("/elsewhere")));
        assert_eq!(runner.resolve_root(&request), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn no_recipe_warns_and_opens_nothing() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.md");
        fs::write(&file, "").unwrap();

        let runner = runner(FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Unknown("markdown".into()));
        let mut session = Session::new("sh");

        let outcome = runner.run_active(&mut host, &mut session, "", None);

        assert!(matches!(outcome, RunOutcome::NoRecipe(_)));
        assert!(host.splits_opened.is_empty());
        assert_eq!(session.in_flight(), 0);
        let (level, message) = host.last_notification().unwrap();
        assert_eq!(*level, NotifyLevel::Warn);
        assert!(message.contains("markdown"));
        assert!(!host.calls.contains(&"save"));
    }

    #[test]
    fn no_active_file_is_an_error() {
        let runner = runner(FakeSystem::new());
        let mut host = FakeHost::new("/x.py", FileType::Python);
        host.file = None;
        let mut session = Session::new("sh");

        let outcome = runner.run_active(&mut host, &mut session, "", None);
        assert!(matches!(outcome, RunOutcome::Failed(RunnerError::NoActiveFile)));
        assert_eq!(host.last_notification().unwrap().0, NotifyLevel::Error);
    }

    #[test]
    fn save_failure_aborts_the_run() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.sh");
        fs::write(&file, "echo hi\n").unwrap();

        let runner = runner(FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        host.fail_save = true;
        let mut session = Session::new("sh");

        let outcome = runner.run_active(&mut host, &mut session, "", None);
        assert!(matches!(outcome, RunOutcome::Failed(RunnerError::Save(_))));
        assert!(host.splits_opened.is_empty());
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn saves_before_opening_the_surface() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("hello.sh");
        fs::write(&file, "echo hello\n").unwrap();

        let mut settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        settings.interpreters.insert("sh".into(), "sh".into());
        let runner = Runner::new(settings, FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        let mut session = Session::new("sh");

        let RunOutcome::Started { run, surface } = runner.run_active(&mut host, &mut session, "", None)
        else {
            panic!("run did not start");
        };
        assert_eq!(host.calls[..2], ["save", "open_split"]);

        let code = finish(&runner, &mut host, &mut session, run).await;
        assert_eq!(code, 0);
        assert_eq!(host.output(surface), ["hello", "[process exited 0]"]);
        assert_eq!(host.last_notification().unwrap().0, NotifyLevel::Info);
    }

    #[tokio::test]
    async fn two_runs_reuse_one_surface() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("t.sh");
        fs::write(&file, "exit 0\n").unwrap();

        let mut settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        settings.interpreters.insert("sh".into(), "sh".into());
        let runner = Runner::new(settings, FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        let mut session = Session::new("sh");

        let first = runner.run_active(&mut host, &mut session, "", None);
        let second = runner.run_active(&mut host, &mut session, "", None);

        let (RunOutcome::Started { surface: a, .. }, RunOutcome::Started { surface: b, .. }) =
            (first, second)
        else {
            panic!("runs did not start");
        };
        assert_eq!(a, b);
        assert_eq!(host.splits_opened.len(), 1);
        assert_eq!(host.cleared, vec![a]);
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error_with_code() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("fail.sh");
        fs::write(&file, "echo oops >&2\nexit 4\n").unwrap();

        let mut settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        settings.interpreters.insert("sh".into(), "sh".into());
        let runner = Runner::new(settings, FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        let mut session = Session::new("sh");

        let RunOutcome::Started { run, surface } = runner.run_active(&mut host, &mut session, "", None)
        else {
            panic!("run did not start");
        };
        let code = finish(&runner, &mut host, &mut session, run).await;

        assert_eq!(code, 4);
        assert_eq!(host.output(surface), ["oops", "[process exited 4]"]);
        let (level, message) = host.last_notification().unwrap();
        assert_eq!(*level, NotifyLevel::Error);
        assert!(message.contains('4'));
    }

    #[tokio::test]
    async fn arguments_reach_the_script_verbatim() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("args.sh");
        fs::write(&file, "for a in \"$@\"; do echo \"<$a>\"; done\n").unwrap();

        let mut settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        settings.interpreters.insert("sh".into(), "sh".into());
        let runner = Runner::new(settings, FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        let mut session = Session::new("sh");

        let RunOutcome::Started { run, surface } =
            runner.run_active(&mut host, &mut session, "one 'two words' \"it's\" $HOME", None)
        else {
            panic!("run did not start");
        };
        finish(&runner, &mut host, &mut session, run).await;

        assert_eq!(
            host.output(surface),
            ["<one>", "<two words>", "<it's>", "<$HOME>", "[process exited 0]"]
        );
    }

    #[tokio::test]
    async fn missing_root_runs_in_the_file_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("where.sh");
        fs::write(&file, "pwd\n").unwrap();

        let mut settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        settings.interpreters.insert("sh".into(), "sh".into());
        let runner = Runner::new(settings, FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        let mut session = Session::new("sh");

        let RunOutcome::Started { run, surface } = runner.run_active(
            &mut host,
            &mut session,
            "",
            Some(Path::new("/nonexistent/quickrun/root")),
        ) else {
            panic!("run did not start");
        };
        let code = finish(&runner, &mut host, &mut session, run).await;

        assert_eq!(code, 0);
        let output = host.output(surface);
        assert_eq!(
            PathBuf::from(&output[0]).canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn output_after_surface_closed_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("late.sh");
        fs::write(&file, "echo late\n").unwrap();

        let mut settings = Settings {
            shell: "sh".to_string(),
            ..Settings::default()
        };
        settings.interpreters.insert("sh".into(), "sh".into());
        let runner = Runner::new(settings, FakeSystem::new());
        let mut host = FakeHost::new(&file, FileType::Shell);
        let mut session = Session::new("sh");

        let RunOutcome::Started { run, surface } = runner.run_active(&mut host, &mut session, "", None)
        else {
            panic!("run did not start");
        };
        host.close_surface(surface);

        let code = finish(&runner, &mut host, &mut session, run).await;
        assert_eq!(code, 0);
        assert!(host.output(surface).is_empty());
        assert_eq!(host.last_notification().unwrap().0, NotifyLevel::Info);
    }
}
