//! Import orchestrator service
//!
//! Sequences one import: the new remote is requested from the creation
//! service in the background while the source is cloned, then the source tree
//! is copied into a clone of the new remote, committed and force-pushed. The
//! working directory is removed on every path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use projimport_core::SecretToken;
use projimport_git::{GitSettings, RepoHandler, TransportUrl};
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info};

use super::creation_client::{
    CreationError, CreationRequest, RemoteCreationResult, RemoteRepoCreator,
};
use super::tree_copy::{copy_missing, CopySummary};
use super::workspace::ImportWorkspace;
use super::{ImportServiceError, ImportServiceResult};

/// One import as asked for by a caller
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub source_repo_url: TransportUrl,
    /// Explicit project name; derived from the source URL when blank
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<String>,
    /// Git server the project is created on
    pub target_server_url: String,
    pub auth_token: SecretToken,
}

impl ImportRequest {
    /// The explicit name if given, otherwise the source's humanish name
    pub fn project_name(&self) -> String {
        match self.project_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.source_repo_url.humanish_name().to_string(),
        }
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub project_name: String,
    /// Clone URL of the newly created remote
    pub repository_url: String,
    pub branch: String,
    pub commit_id: String,
    pub copy: CopySummary,
}

type PendingRemote = JoinHandle<Result<RemoteCreationResult, CreationError>>;

/// Runs imports; stateless apart from its collaborators, so one instance
/// serves concurrent requests.
pub struct ImportOrchestrator {
    creator: Arc<dyn RemoteRepoCreator>,
    settings: Arc<GitSettings>,
    work_root: PathBuf,
}

impl ImportOrchestrator {
    pub fn new(
        creator: Arc<dyn RemoteRepoCreator>,
        settings: Arc<GitSettings>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            creator,
            settings,
            work_root: work_root.into(),
        }
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Run one import to completion.
    ///
    /// The working directory is removed whether or not the import succeeds,
    /// and a failure to remove it never replaces the import's own error.
    pub async fn import_project(
        &self,
        request: ImportRequest,
    ) -> ImportServiceResult<ImportOutcome> {
        let project_name = request.project_name();
        info!(
            "Importing {} as project '{}' on {}",
            request.source_repo_url, project_name, request.target_server_url
        );

        let workspace =
            ImportWorkspace::create(&self.work_root).map_err(ImportServiceError::Workspace)?;
        let result = self
            .run_import(&request, project_name, workspace.path())
            .await;
        workspace.cleanup().await;

        match &result {
            Ok(outcome) => info!(
                "Imported {} into {} ({} files copied)",
                request.source_repo_url, outcome.repository_url, outcome.copy.copied_files
            ),
            Err(e) => error!("Import of {} failed: {}", request.source_repo_url, e),
        }
        result
    }

    async fn run_import(
        &self,
        request: &ImportRequest,
        project_name: String,
        work_folder: &Path,
    ) -> ImportServiceResult<ImportOutcome> {
        // Left running on early failure; the service may still create the project.
        let pending_remote = self.request_remote(request, &project_name);

        let mut source = RepoHandler::source(
            request.source_repo_url.as_str(),
            work_folder,
            self.settings.clone(),
        );
        source.clone_repo().await?;

        let repository_url = await_remote(pending_remote).await?;

        let credentials = self.settings.credentials(request.auth_token.clone());
        let mut destination = RepoHandler::destination(
            repository_url.as_str(),
            work_folder,
            credentials,
            self.settings.clone(),
        );
        destination.clone_repo().await?;

        let from = source.clone_path().to_path_buf();
        let to = destination.clone_path().to_path_buf();
        let copy = task::spawn_blocking(move || copy_missing(&from, &to))
            .await
            .map_err(|e| ImportServiceError::Internal(format!("Copy task failed: {}", e)))?
            .map_err(ImportServiceError::Copy)?;

        let push = destination.commit_and_push().await?;

        Ok(ImportOutcome {
            project_name,
            repository_url,
            branch: push.branch,
            commit_id: push.commit_id,
            copy,
        })
    }

    fn request_remote(&self, request: &ImportRequest, project_name: &str) -> PendingRemote {
        let creator = self.creator.clone();
        let creation_request = CreationRequest {
            project_name: project_name.to_string(),
            description: request.description.clone(),
            visibility: request.visibility.clone(),
            server_url: request.target_server_url.clone(),
            token: request.auth_token.clone(),
        };
        tokio::spawn(async move { creator.request_creation(creation_request).await })
    }
}

async fn await_remote(pending: PendingRemote) -> ImportServiceResult<String> {
    let result = pending.await.map_err(|e| {
        ImportServiceError::Internal(format!("Project creation task failed: {}", e))
    })??;

    if !result.is_success() {
        error!(
            "Project creation rejected with status {}: {}",
            result.status, result.message
        );
        return Err(ImportServiceError::RemoteCreationRejected(result.message));
    }

    let repository_url = result.message.trim().to_string();
    debug!("Project structure created at {}", repository_url);
    Ok(repository_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{file_url, seed_bare_repo, StubCreator};
    use async_trait::async_trait;
    use git2::Repository;
    use projimport_git::GitError;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Rejects the creation once the source checkout is complete, after
    /// putting a regular file where the import's working directory was.
    struct WorkspaceClobberingCreator {
        work_root: PathBuf,
    }

    impl WorkspaceClobberingCreator {
        async fn finished_workspace(&self) -> PathBuf {
            for _ in 0..500 {
                let ready = fs::read_dir(&self.work_root)
                    .unwrap()
                    .flatten()
                    .map(|entry| entry.path())
                    .find(|path| path.join("source/.git/index").exists());
                if let Some(workspace) = ready {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    return workspace;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("source checkout never appeared under {:?}", self.work_root);
        }
    }

    #[async_trait]
    impl RemoteRepoCreator for WorkspaceClobberingCreator {
        async fn request_creation(
            &self,
            _request: CreationRequest,
        ) -> Result<RemoteCreationResult, CreationError> {
            let workspace = self.finished_workspace().await;
            fs::rename(&workspace, workspace.with_extension("moved")).unwrap();
            fs::write(&workspace, "not a directory").unwrap();
            Ok(RemoteCreationResult {
                status: 1,
                message: "name taken".to_string(),
            })
        }
    }

    fn request(source: &Path, name: Option<&str>) -> ImportRequest {
        ImportRequest {
            source_repo_url: TransportUrl::parse(&file_url(source)).unwrap(),
            project_name: name.map(str::to_string),
            description: None,
            visibility: None,
            target_server_url: "https://gitlab.example.com".to_string(),
            auth_token: SecretToken::new("token"),
        }
    }

    fn orchestrator(creator: Arc<StubCreator>, work_root: &Path) -> ImportOrchestrator {
        ImportOrchestrator::new(creator, Arc::new(GitSettings::default()), work_root)
    }

    fn is_empty_dir(path: &Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_import_pushes_source_tree_into_new_remote() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(&source, &[("README.md", "hello"), ("main.rs", "fn main() {}")]);
        let destination = temp.path().join("created.git");
        Repository::init_bare(&destination).unwrap();
        let work_root = temp.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        let creator = StubCreator::succeeding(file_url(&destination));
        let outcome = orchestrator(creator.clone(), &work_root)
            .import_project(request(&source, None))
            .await
            .unwrap();

        assert_eq!(outcome.repository_url, file_url(&destination));
        assert_eq!(outcome.project_name, "proj");
        assert_eq!(outcome.copy.copied_files, 2);

        let remote = Repository::open_bare(&destination).unwrap();
        let commit = remote
            .find_reference(&format!("refs/heads/{}", outcome.branch))
            .unwrap()
            .peel_to_commit()
            .unwrap();
        assert_eq!(commit.id().to_string(), outcome.commit_id);
        let tree = commit.tree().unwrap();
        assert!(tree.get_path(Path::new("README.md")).is_ok());
        assert!(tree.get_path(Path::new("main.rs")).is_ok());

        let requests = creator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].project_name, "proj");
        assert_eq!(requests[0].server_url, "https://gitlab.example.com");

        assert!(is_empty_dir(&work_root));
    }

    #[tokio::test]
    async fn test_explicit_name_is_sent_to_creator() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(&source, &[("a.txt", "a")]);
        let destination = temp.path().join("created.git");
        Repository::init_bare(&destination).unwrap();

        let creator = StubCreator::succeeding(file_url(&destination));
        let outcome = orchestrator(creator.clone(), temp.path())
            .import_project(request(&source, Some("renamed")))
            .await
            .unwrap();

        assert_eq!(outcome.project_name, "renamed");
        assert_eq!(creator.requests()[0].project_name, "renamed");
    }

    #[tokio::test]
    async fn test_rejected_creation_reports_message_and_pushes_nothing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(&source, &[("README.md", "hello")]);
        let work_root = temp.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        let err = orchestrator(StubCreator::rejecting("name taken"), &work_root)
            .import_project(request(&source, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportServiceError::RemoteCreationRejected(_)));
        assert_eq!(err.to_string(), "name taken");
        assert!(is_empty_dir(&work_root));
    }

    #[tokio::test]
    async fn test_creation_transport_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(&source, &[("README.md", "hello")]);
        let work_root = temp.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        let err = orchestrator(StubCreator::failing(502), &work_root)
            .import_project(request(&source, None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImportServiceError::CreationRequest(CreationError::Status { status: 502, .. })
        ));
        assert!(is_empty_dir(&work_root));
    }

    #[tokio::test]
    async fn test_source_clone_failure_cleans_up() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.git");
        let destination = temp.path().join("created.git");
        Repository::init_bare(&destination).unwrap();
        let work_root = temp.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        let err = orchestrator(StubCreator::succeeding(file_url(&destination)), &work_root)
            .import_project(request(&missing, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportServiceError::Git(GitError::Git(_))));
        assert!(is_empty_dir(&work_root));
    }

    #[tokio::test]
    async fn test_unreachable_new_remote_fails_at_destination_clone() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(&source, &[("README.md", "hello")]);
        let work_root = temp.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        let creator = StubCreator::succeeding(file_url(&temp.path().join("never-created.git")));
        let err = orchestrator(creator, &work_root)
            .import_project(request(&source, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportServiceError::Git(_)));
        assert!(is_empty_dir(&work_root));
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_primary_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(&source, &[("README.md", "hello")]);
        let work_root = temp.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        let creator = Arc::new(WorkspaceClobberingCreator {
            work_root: work_root.clone(),
        });
        let orchestrator =
            ImportOrchestrator::new(creator, Arc::new(GitSettings::default()), &work_root);
        let err = orchestrator
            .import_project(request(&source, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportServiceError::RemoteCreationRejected(_)));
        assert_eq!(err.to_string(), "name taken");

        // The file left in place of the working directory could not be removed
        let leftovers: Vec<PathBuf> = fs::read_dir(&work_root)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.is_file())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_ignored_but_tracked_files_reach_new_remote() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("proj.git");
        seed_bare_repo(
            &source,
            &[(".gitignore", "*.log\n"), ("keep.log", "kept"), ("a.txt", "a")],
        );
        let destination = temp.path().join("created.git");
        Repository::init_bare(&destination).unwrap();

        let outcome = orchestrator(StubCreator::succeeding(file_url(&destination)), temp.path())
            .import_project(request(&source, None))
            .await
            .unwrap();

        assert_eq!(outcome.copy.copied_files, 3);
        let remote = Repository::open_bare(&destination).unwrap();
        let tree = remote
            .find_reference(&format!("refs/heads/{}", outcome.branch))
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .tree()
            .unwrap();
        for name in [".gitignore", "keep.log", "a.txt"] {
            assert!(tree.get_path(Path::new(name)).is_ok(), "{} not pushed", name);
        }
    }

    #[test]
    fn test_blank_explicit_name_falls_back_to_url() {
        let request = ImportRequest {
            source_repo_url: TransportUrl::parse("https://example.com/group/widget.git").unwrap(),
            project_name: Some("  ".to_string()),
            description: None,
            visibility: None,
            target_server_url: String::new(),
            auth_token: SecretToken::new("t"),
        };
        assert_eq!(request.project_name(), "widget");
    }
}
