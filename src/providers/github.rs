use failure::{Error, ResultExt};
use reqwest::blocking::Client;
use reqwest::Url;
use std::fmt::{self, Debug, Formatter};

use super::DEFAULT_BRANCH;
use crate::errors::is_not_found;
use crate::utils::{self, Auth, Paginated};
use crate::{Options, ProviderKind, Repository, RepositoryManagement, RepositoryManagementBuilder};

const PUBLIC_API: &str = "https://api.github.com/";
const JSON: &str = "application/vnd.github.v3+json";
const RAW: &str = "application/vnd.github.v3.raw";

/// Recognises options pointing at github.com or a GitHub Enterprise
/// instance.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GitHubBuilder;

impl RepositoryManagementBuilder for GitHubBuilder {
    fn name(&self) -> &str {
        "github"
    }

    fn build(
        &self,
        options: &Options,
    ) -> Result<Option<Box<dyn RepositoryManagement>>, Error> {
        if !options.targets(ProviderKind::GitHub) {
            return Ok(None);
        }

        let gh = GitHub::with_options(options.clone())?;
        Ok(Some(Box::new(gh)))
    }
}

/// An interface to the repositories stored on GitHub.
#[derive(Clone)]
pub struct GitHub {
    api_root: Url,
    client: Client,
    options: Options,
}

impl GitHub {
    /// Create a new `GitHub` talking to whichever server `options.root_url`
    /// points at.
    pub fn with_options(options: Options) -> Result<GitHub, Error> {
        let root = utils::parse_root_url(&options)?;

        let api_root = match root.host_str() {
            Some("github.com") | Some("www.github.com") | Some("api.github.com") => {
                Url::parse(PUBLIC_API)?
            }
            _ => root.join("api/v3/")?,
        };
        debug!("Using the GitHub API at {}", api_root);

        Ok(GitHub {
            api_root,
            client: utils::http_client()?,
            options,
        })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn auth(&self) -> Auth {
        if let Some(ref token) = self.options.token {
            Auth::Header {
                name: "Authorization",
                prefix: "token ",
                value: token.clone(),
            }
        } else if let Some(ref username) = self.options.username {
            Auth::Basic {
                username: username.clone(),
                password: self.options.password.clone(),
            }
        } else {
            Auth::Anonymous
        }
    }

    fn list(&self, kind: &str, owner: &str) -> Result<Vec<RawRepo>, Error> {
        let mut first_page = utils::endpoint(&self.api_root, vec![kind, owner, "repos"]);
        first_page.query_pairs_mut().append_pair("per_page", "100");

        Paginated::new(self.client.clone(), self.auth(), JSON, first_page).collect()
    }

    fn convert_repo(&self, raw: RawRepo) -> Repository {
        Repository {
            name: raw.name,
            ssh_url: raw.ssh_url,
            clone_url: raw.clone_url,
            requested_branch: raw
                .default_branch
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        }
    }
}

impl RepositoryManagement for GitHub {
    fn repositories(&self, organization: &str) -> Result<Vec<Repository>, Error> {
        utils::check_identifier("organization", organization)?;
        debug!("Fetching repositories for {}", organization);

        let raw = match self.list("orgs", organization) {
            Ok(raw) => raw,
            Err(ref e) if is_not_found(e) => {
                debug!("{} isn't an organisation, trying users instead", organization);
                self.list("users", organization)
                    .context("Unable to fetch the user's repositories")?
            }
            Err(e) => return Err(e),
        };

        let repos: Vec<Repository> = raw
            .into_iter()
            .filter(|r| self.options.is_included(&r.name))
            .map(|r| self.convert_repo(r))
            .collect();

        debug!("{} repos found for {}", repos.len(), organization);
        Ok(repos)
    }

    fn file_content(
        &self,
        organization: &str,
        repository: &str,
        branch: &str,
        file_path: &str,
    ) -> Result<String, Error> {
        let organization = utils::check_identifier("organization", organization)?;
        let repository = utils::check_identifier("repository", repository)?;
        let segments = vec!["repos", organization, repository, "contents"]
            .into_iter()
            .chain(utils::file_path_segments(file_path)?);
        let mut url = utils::endpoint(&self.api_root, segments);
        url.query_pairs_mut().append_pair("ref", branch);

        let response = utils::send(&self.client, &self.auth(), url, RAW)?;
        let content = response
            .text()
            .context("Unable to read the file's contents")?;

        Ok(content)
    }
}

impl Debug for GitHub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitHub")
            .field("api_root", &self.api_root.as_str())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRepo {
    name: String,
    ssh_url: String,
    clone_url: String,
    default_branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailedRequest, InvalidPath};
    use mockito::{Matcher, Server};

    fn options_for(server: &Server) -> Options {
        Options::builder()
            .root_url(server.url())
            .repository(ProviderKind::GitHub)
            .token("s3cr3t")
            .exclude("^.*-archived$")
            .build()
            .unwrap()
    }

    fn raw_repo(name: &str) -> String {
        format!(
            r#"{{"name": "{0}", "full_name": "acme/{0}", "ssh_url": "git@github.com:acme/{0}.git", "clone_url": "https://github.com/acme/{0}.git", "default_branch": "main"}}"#,
            name
        )
    }

    #[test]
    fn recognise_github_urls() {
        let github = Options::builder()
            .root_url("https://github.example.com")
            .build()
            .unwrap();
        let gitlab = Options::builder()
            .root_url("https://gitlab.example.com")
            .build()
            .unwrap();

        assert!(GitHubBuilder.build(&github).unwrap().is_some());
        assert!(GitHubBuilder.build(&gitlab).unwrap().is_none());
    }

    #[test]
    fn recognised_but_malformed_urls_are_an_error() {
        let options = Options::builder()
            .root_url("github")
            .build()
            .unwrap();

        assert!(GitHubBuilder.build(&options).is_err());
    }

    #[test]
    fn public_github_uses_the_api_subdomain() {
        let options = Options::builder()
            .root_url("https://github.com/")
            .build()
            .unwrap();

        let gh = GitHub::with_options(options).unwrap();

        assert_eq!(gh.api_root().as_str(), "https://api.github.com/");
    }

    #[test]
    fn enterprise_servers_use_api_v3() {
        let options = Options::builder()
            .root_url("https://github.example.com")
            .build()
            .unwrap();

        let gh = GitHub::with_options(options).unwrap();

        assert_eq!(gh.api_root().as_str(), "https://github.example.com/api/v3/");
    }

    #[test]
    fn list_an_organisations_repositories_across_pages() {
        let mut server = Server::new();
        let next = format!("<{}/api/v3/orgs/acme/repos?page=2>; rel=\"next\"", server.url());
        let first = server
            .mock("GET", "/api/v3/orgs/acme/repos")
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .match_header("authorization", "token s3cr3t")
            .with_header("content-type", "application/json")
            .with_header("link", &next)
            .with_body(format!("[{}, {}]", raw_repo("app"), raw_repo("old-archived")))
            .create();
        let second = server
            .mock("GET", "/api/v3/orgs/acme/repos")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", raw_repo("lib")))
            .create();
        let gh = GitHub::with_options(options_for(&server)).unwrap();

        let got = gh.repositories("acme").unwrap();

        first.assert();
        second.assert();
        let names: Vec<&str> = got.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["app", "lib"]);
        assert_eq!(got[0].ssh_url, "git@github.com:acme/app.git");
        assert_eq!(got[0].clone_url, "https://github.com/acme/app.git");
        assert_eq!(got[0].requested_branch, "main");
    }

    #[test]
    fn fall_back_to_user_repositories() {
        let mut server = Server::new();
        let _org = server
            .mock("GET", "/api/v3/orgs/octocat/repos")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create();
        let user = server
            .mock("GET", "/api/v3/users/octocat/repos")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", raw_repo("hello-world")))
            .create();
        let gh = GitHub::with_options(options_for(&server)).unwrap();

        let got = gh.repositories("octocat").unwrap();

        user.assert();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "hello-world");
    }

    #[test]
    fn other_failures_are_reported() {
        let mut server = Server::new();
        let _org = server
            .mock("GET", "/api/v3/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_status(401)
            .create();
        let gh = GitHub::with_options(options_for(&server)).unwrap();

        let err = gh.repositories("acme").unwrap_err();

        let failed = err.downcast_ref::<FailedRequest>().unwrap();
        assert_eq!(failed.status.as_u16(), 401);
    }

    #[test]
    fn fall_back_to_basic_auth_without_a_token() {
        let mut server = Server::new();
        let repos = server
            .mock("GET", "/api/v3/orgs/acme/repos")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", raw_repo("app")))
            .create();
        let options = Options::builder()
            .root_url(server.url())
            .repository(ProviderKind::GitHub)
            .username("jdoe")
            .password("hunter2")
            .build()
            .unwrap();
        let gh = GitHub::with_options(options).unwrap();

        let got = gh.repositories("acme").unwrap();

        repos.assert();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn anonymous_requests_send_no_credentials() {
        let mut server = Server::new();
        let repos = server
            .mock("GET", "/api/v3/orgs/acme/repos")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create();
        let options = Options::builder()
            .root_url(server.url())
            .repository(ProviderKind::GitHub)
            .build()
            .unwrap();
        let gh = GitHub::with_options(options).unwrap();

        let got = gh.repositories("acme").unwrap();

        repos.assert();
        assert!(got.is_empty());
    }

    #[test]
    fn relative_file_paths_never_reach_the_server() {
        let mut server = Server::new();
        let anything = server
            .mock("GET", Matcher::Any)
            .match_query(Matcher::Any)
            .expect(0)
            .create();
        let gh = GitHub::with_options(options_for(&server)).unwrap();

        let err = gh
            .file_content("acme", "app", "main", "docs/../README.md")
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidPath>().is_some());

        let err = gh.repositories("").unwrap_err();
        assert!(err.downcast_ref::<InvalidPath>().is_some());

        anything.assert();
    }

    #[test]
    fn read_a_file() {
        let mut server = Server::new();
        let file = server
            .mock("GET", "/api/v3/repos/acme/app/contents/ci/pipeline.yml")
            .match_query(Matcher::UrlEncoded("ref".into(), "develop".into()))
            .match_header("accept", RAW)
            .with_body("lowercaseEnvironmentName: test\n")
            .create();
        let gh = GitHub::with_options(options_for(&server)).unwrap();

        let got = gh
            .file_content("acme", "app", "develop", "ci/pipeline.yml")
            .unwrap();

        file.assert();
        assert_eq!(got, "lowercaseEnvironmentName: test\n");
    }
}
