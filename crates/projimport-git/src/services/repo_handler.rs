use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::build::RepoBuilder;
use git2::{
    Commit, Cred, CredentialType, ErrorCode, FetchOptions, IndexAddOption, PushOptions,
    RemoteCallbacks, Repository, Signature,
};
use projimport_config::service::{
    DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME, DEFAULT_COMMIT_MESSAGE, DEFAULT_GIT_USERNAME,
};
use projimport_config::ServerConfig;
use projimport_core::SecretToken;
use tokio::task;
use tracing::{debug, info, trace};

use crate::error::{GitError, GitResult};

const REMOTE_NAME: &str = "origin";
/// User for ssh remotes whose URL names none
const DEFAULT_SSH_USER: &str = "git";
/// libgit2 keeps asking for credentials while the server rejects them.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Whether a checkout is read-only input or the push target of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutRole {
    Source,
    Destination,
}

impl CheckoutRole {
    /// Directory name of the checkout inside the import's work folder
    pub fn folder_name(&self) -> &'static str {
        match self {
            CheckoutRole::Source => "source",
            CheckoutRole::Destination => "destination",
        }
    }
}

impl fmt::Display for CheckoutRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCredentials {
    pub username: String,
    pub token: SecretToken,
}

/// Git behaviour shared by every checkout of the service
#[derive(Debug, Clone)]
pub struct GitSettings {
    /// Username paired with caller tokens, e.g. `gitlab-ci-token`
    pub username: String,
    pub commit_message: String,
    /// Fallback identity when the checkout's git config has none
    pub author_name: String,
    pub author_email: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            username: DEFAULT_GIT_USERNAME.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

impl From<&ServerConfig> for GitSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            username: config.git_username.clone(),
            commit_message: config.commit_message.clone(),
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
        }
    }
}

impl GitSettings {
    pub fn credentials(&self, token: SecretToken) -> GitCredentials {
        GitCredentials {
            username: self.username.clone(),
            token,
        }
    }
}

/// Result of a successful [`RepoHandler::commit_and_push`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSummary {
    pub branch: String,
    pub commit_id: String,
}

/// One local working checkout of one remote repository
#[derive(Debug)]
pub struct RepoHandler {
    repo_url: String,
    clone_path: PathBuf,
    role: CheckoutRole,
    credentials: Option<GitCredentials>,
    settings: Arc<GitSettings>,
    cloned: bool,
}

impl RepoHandler {
    /// Read-only checkout, cloned anonymously unless credentials are added
    pub fn source(
        repo_url: impl Into<String>,
        work_folder: &Path,
        settings: Arc<GitSettings>,
    ) -> Self {
        Self::new(repo_url.into(), work_folder, CheckoutRole::Source, None, settings)
    }

    /// Push-capable checkout of a freshly created remote
    pub fn destination(
        repo_url: impl Into<String>,
        work_folder: &Path,
        credentials: GitCredentials,
        settings: Arc<GitSettings>,
    ) -> Self {
        Self::new(
            repo_url.into(),
            work_folder,
            CheckoutRole::Destination,
            Some(credentials),
            settings,
        )
    }

    fn new(
        repo_url: String,
        work_folder: &Path,
        role: CheckoutRole,
        credentials: Option<GitCredentials>,
        settings: Arc<GitSettings>,
    ) -> Self {
        Self {
            clone_path: work_folder.join(role.folder_name()),
            repo_url,
            role,
            credentials,
            settings,
            cloned: false,
        }
    }

    pub fn with_credentials(mut self, credentials: GitCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn clone_path(&self) -> &Path {
        &self.clone_path
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn role(&self) -> CheckoutRole {
        self.role
    }

    /// Clone the remote into `{work_folder}/{source|destination}`
    pub async fn clone_repo(&mut self) -> GitResult<()> {
        info!("Cloning {} repository from {}...", self.role, self.repo_url);

        let repo_url = self.repo_url.clone();
        let clone_path = self.clone_path.clone();
        let credentials = self.credentials.clone();

        task::spawn_blocking(move || -> GitResult<()> {
            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(remote_callbacks(credentials.as_ref()));

            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch_options);
            builder.clone(&repo_url, &clone_path)?;
            Ok(())
        })
        .await??;

        self.cloned = true;
        info!("Remote repository cloned at {}", self.clone_path.display());
        Ok(())
    }

    /// Stage the whole working tree, commit it and force-push the current branch
    ///
    /// Only valid for destination checkouts; a source checkout is rejected
    /// before the repository is opened.
    pub async fn commit_and_push(&self) -> GitResult<PushSummary> {
        if self.role == CheckoutRole::Source {
            return Err(GitError::SourceImmutable);
        }
        if !self.cloned {
            return Err(GitError::NotCloned(self.repo_url.clone()));
        }

        let repo_url = self.repo_url.clone();
        let clone_path = self.clone_path.clone();
        let credentials = self.credentials.clone();
        let settings = self.settings.clone();

        let summary = task::spawn_blocking(move || -> GitResult<PushSummary> {
            let repo = Repository::open(&clone_path)?;

            debug!("Adding contents to repo...");
            let mut index = repo.index()?;
            // Forced so files tracked upstream but matched by .gitignore are kept.
            index.add_all(["*"].iter(), IndexAddOption::FORCE, None)?;
            index.update_all(["*"].iter(), None)?;
            index.write()?;
            let tree_id = index.write_tree()?;
            let tree = repo.find_tree(tree_id)?;

            debug!("Creating commit...");
            let signature = repo
                .signature()
                .or_else(|_| Signature::now(&settings.author_name, &settings.author_email))?;
            let parent = head_commit(&repo)?;
            let parents: Vec<&Commit> = parent.iter().collect();
            // libgit2 never runs hooks, so nothing can veto this commit.
            let commit_id = repo.commit(
                Some("HEAD"),
                &signature,
                &signature,
                &settings.commit_message,
                &tree,
                &parents,
            )?;

            let branch_ref = head_branch_ref(&repo, &repo_url)?;
            debug!("Pushing {} ({}) to {}...", branch_ref, commit_id, repo_url);
            force_push(&repo, &branch_ref, credentials.as_ref(), &repo_url)?;

            Ok(PushSummary {
                branch: branch_ref
                    .strip_prefix("refs/heads/")
                    .unwrap_or(&branch_ref)
                    .to_string(),
                commit_id: commit_id.to_string(),
            })
        })
        .await??;

        info!(
            "Pushed commit {} to branch {} of {}",
            summary.commit_id, summary.branch, self.repo_url
        );
        Ok(summary)
    }
}

fn head_commit(repo: &Repository) -> GitResult<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Full name of the branch HEAD points at, which may not exist yet
fn head_branch_ref(repo: &Repository, repo_url: &str) -> GitResult<String> {
    let head = repo.find_reference("HEAD")?;
    head.symbolic_target()
        .map(str::to_string)
        .ok_or_else(|| GitError::DetachedHead(repo_url.to_string()))
}

fn force_push(
    repo: &Repository,
    branch_ref: &str,
    credentials: Option<&GitCredentials>,
    repo_url: &str,
) -> GitResult<()> {
    let mut remote = repo.find_remote(REMOTE_NAME)?;
    let refspec = format!("+{0}:{0}", branch_ref);
    let rejection: RefCell<Option<String>> = RefCell::new(None);

    {
        let mut callbacks = remote_callbacks(credentials);
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                *rejection.borrow_mut() = Some(format!("{}: {}", refname, message));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);
        remote.push(&[&refspec], Some(&mut push_options))?;
    }

    match rejection.into_inner() {
        Some(message) => Err(GitError::PushRejected {
            remote: repo_url.to_string(),
            message,
        }),
        None => Ok(()),
    }
}

/// Credential offered for one libgit2 authentication request
#[derive(Debug, PartialEq, Eq)]
enum CredentialChoice<'a> {
    SshAgent(&'a str),
    Username(&'a str),
    UserPass(&'a GitCredentials),
    Default,
}

fn choose_credential<'a>(
    credentials: Option<&'a GitCredentials>,
    username_from_url: Option<&'a str>,
    allowed_types: CredentialType,
) -> CredentialChoice<'a> {
    let ssh_user = username_from_url.unwrap_or(DEFAULT_SSH_USER);
    if allowed_types.contains(CredentialType::SSH_KEY) {
        return CredentialChoice::SshAgent(ssh_user);
    }
    if allowed_types.contains(CredentialType::USERNAME) {
        return CredentialChoice::Username(ssh_user);
    }
    match credentials {
        Some(credentials) if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) => {
            CredentialChoice::UserPass(credentials)
        }
        _ => CredentialChoice::Default,
    }
}

fn remote_callbacks(credentials: Option<&GitCredentials>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();

    let mut attempts = 0;
    callbacks.credentials(move |_url, username_from_url, allowed_types| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(
                "authentication failed: credentials were rejected",
            ));
        }
        match choose_credential(credentials, username_from_url, allowed_types) {
            CredentialChoice::SshAgent(user) => Cred::ssh_key_from_agent(user),
            CredentialChoice::Username(user) => Cred::username(user),
            CredentialChoice::UserPass(credentials) => {
                Cred::userpass_plaintext(&credentials.username, credentials.token.expose())
            }
            CredentialChoice::Default => Cred::default(),
        }
    });

    callbacks.transfer_progress(|stats| {
        trace!(
            "Transfer progress: {}/{} objects, {} bytes",
            stats.received_objects(),
            stats.total_objects(),
            stats.received_bytes()
        );
        true
    });

    callbacks
}
