//! Builders registered with the global registry are picked up by every
//! crawler created with `ProjectCrawler::new()`.

use failure::Error;
use mockito::{Matcher, Server};
use project_crawler::{
    registry, NoMatchingProvider, Options, ProjectCrawler, ProviderKind, Repository,
    RepositoryManagement, RepositoryManagementBuilder,
};

/// Pretends to be an in-house hosting provider living at `*.plugin.test`.
struct InHouse;

impl RepositoryManagementBuilder for InHouse {
    fn name(&self) -> &str {
        "in-house"
    }

    fn build(&self, options: &Options) -> Result<Option<Box<dyn RepositoryManagement>>, Error> {
        if options.root_url.contains(".plugin.test") {
            Ok(Some(Box::new(InHouseManagement)))
        } else {
            Ok(None)
        }
    }
}

struct InHouseManagement;

impl RepositoryManagement for InHouseManagement {
    fn repositories(&self, organization: &str) -> Result<Vec<Repository>, Error> {
        Ok(vec![
            Repository::new(format!("{}/app", organization), "", "", "master"),
            Repository::new(format!("{}/lib", organization), "", "", "master"),
        ])
    }

    fn file_content(
        &self,
        _organization: &str,
        _repository: &str,
        _branch: &str,
        file_path: &str,
    ) -> Result<String, Error> {
        Ok(format!("contents of {}", file_path))
    }
}

fn register_in_house() {
    // every test registers its own copy, the first one always wins
    registry::register(InHouse);
}

#[test]
fn globally_registered_builders_are_used() {
    register_in_house();
    let options = Options::builder()
        .root_url("https://github.plugin.test")
        .build()
        .unwrap();
    let crawler = ProjectCrawler::new(options);

    let repos = crawler.repositories("acme").unwrap();
    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["acme/app", "acme/lib"]);

    let content = crawler
        .file_content("acme", "app", "master", "sc-pipelines.yml")
        .unwrap();
    assert_eq!(content, "contents of sc-pipelines.yml");
}

#[test]
fn unknown_providers_are_rejected() {
    let options = Options::builder()
        .root_url("https://svn.example.org")
        .build()
        .unwrap();
    let crawler = ProjectCrawler::new(options);

    let err = crawler.repositories("acme").unwrap_err();

    assert!(err.downcast_ref::<NoMatchingProvider>().is_some());
}

#[test]
fn fall_through_to_the_builtin_github_provider() {
    register_in_house();
    let mut server = Server::new();
    let repos = server
        .mock("GET", "/api/v3/orgs/acme/repos")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"name": "app", "ssh_url": "git@github.example.com:acme/app.git", "clone_url": "https://github.example.com/acme/app.git", "default_branch": "master"},
                {"name": "lib", "ssh_url": "git@github.example.com:acme/lib.git", "clone_url": "https://github.example.com/acme/lib.git", "default_branch": "master"}
            ]"#,
        )
        .create();
    let options = Options::builder()
        .root_url(server.url())
        .repository(ProviderKind::GitHub)
        .build()
        .unwrap();
    let crawler = ProjectCrawler::new(options);

    let got = crawler.repositories("acme").unwrap();

    repos.assert();
    assert_eq!(
        got,
        vec![
            Repository::new(
                "app",
                "git@github.example.com:acme/app.git",
                "https://github.example.com/acme/app.git",
                "master"
            ),
            Repository::new(
                "lib",
                "git@github.example.com:acme/lib.git",
                "https://github.example.com/acme/lib.git",
                "master"
            ),
        ]
    );
}
