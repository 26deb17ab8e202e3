use failure::{Error, ResultExt};
use reqwest::blocking::Client;
use reqwest::Url;
use std::fmt::{self, Debug, Formatter};

use super::DEFAULT_BRANCH;
use crate::errors::is_not_found;
use crate::utils::{self, Auth, Paginated};
use crate::{Options, ProviderKind, Repository, RepositoryManagement, RepositoryManagementBuilder};

const JSON: &str = "application/json";
const RAW: &str = "text/plain";

/// Recognises options pointing at gitlab.com or a self-hosted GitLab.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GitLabBuilder;

impl RepositoryManagementBuilder for GitLabBuilder {
    fn name(&self) -> &str {
        "gitlab"
    }

    fn build(
        &self,
        options: &Options,
    ) -> Result<Option<Box<dyn RepositoryManagement>>, Error> {
        if !options.targets(ProviderKind::GitLab) {
            return Ok(None);
        }

        let gitlab = GitLab::with_options(options.clone())?;
        Ok(Some(Box::new(gitlab)))
    }
}

/// A provider which queries the GitLab API.
#[derive(Clone)]
pub struct GitLab {
    api_root: Url,
    client: Client,
    options: Options,
}

impl GitLab {
    pub fn with_options(options: Options) -> Result<GitLab, Error> {
        let api_root = utils::parse_root_url(&options)?.join("api/v4/")?;
        debug!("Using the GitLab API at {}", api_root);

        Ok(GitLab {
            api_root,
            client: utils::http_client()?,
            options,
        })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// GitLab only accepts personal access tokens, so fall back to the
    /// password when no token was given.
    fn auth(&self) -> Auth {
        match self.options.token.as_ref().or(self.options.password.as_ref()) {
            Some(token) => Auth::Header {
                name: "PRIVATE-TOKEN",
                prefix: "",
                value: token.clone(),
            },
            None => Auth::Anonymous,
        }
    }

    fn list(&self, kind: &str, owner: &str) -> Result<Vec<Project>, Error> {
        let mut first_page = utils::endpoint(&self.api_root, vec![kind, owner, "projects"]);
        first_page.query_pairs_mut().append_pair("per_page", "100");

        Paginated::new(self.client.clone(), self.auth(), JSON, first_page).collect()
    }

    fn project_to_repo(&self, project: Project) -> Repository {
        let name = if project.path.is_empty() {
            project.name
        } else {
            project.path
        };

        Repository {
            name,
            ssh_url: project.ssh_url_to_repo,
            clone_url: project.http_url_to_repo,
            requested_branch: project
                .default_branch
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        }
    }
}

impl RepositoryManagement for GitLab {
    fn repositories(&self, organization: &str) -> Result<Vec<Repository>, Error> {
        utils::check_identifier("organization", organization)?;
        debug!("Fetching projects for {}", organization);

        let projects = match self.list("groups", organization) {
            Ok(projects) => projects,
            Err(ref e) if is_not_found(e) => {
                debug!("{} isn't a group, trying users instead", organization);
                self.list("users", organization)
                    .context("Unable to fetch the user's projects")?
            }
            Err(e) => return Err(e),
        };

        let repos: Vec<Repository> = projects
            .into_iter()
            .map(|p| self.project_to_repo(p))
            .filter(|r| self.options.is_included(&r.name))
            .collect();

        debug!("Found {} projects for {}", repos.len(), organization);
        Ok(repos)
    }

    fn file_content(
        &self,
        organization: &str,
        repository: &str,
        branch: &str,
        file_path: &str,
    ) -> Result<String, Error> {
        let project = format!(
            "{}/{}",
            utils::check_identifier("organization", organization)?,
            utils::check_identifier("repository", repository)?
        );
        // GitLab wants the whole path as a single encoded segment
        let file_path = utils::file_path_segments(file_path)?.join("/");
        let mut url = utils::endpoint(
            &self.api_root,
            vec!["projects", project.as_str(), "repository", "files", file_path.as_str(), "raw"],
        );
        url.query_pairs_mut().append_pair("ref", branch);

        let response = utils::send(&self.client, &self.auth(), url, RAW)?;
        let content = response
            .text()
            .context("Unable to read the file's contents")?;

        Ok(content)
    }
}

impl Debug for GitLab {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitLab")
            .field("api_root", &self.api_root.as_str())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Project {
    name: String,
    path: String,
    ssh_url_to_repo: String,
    http_url_to_repo: String,
    default_branch: Option<String>,
}
