/// A single repository reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub ssh_url: String,
    pub clone_url: String,
    /// The branch the provider considers the repository's default.
    pub requested_branch: String,
}

impl Repository {
    pub fn new<N, S, C, B>(
        name: N,
        ssh_url: S,
        clone_url: C,
        requested_branch: B,
    ) -> Repository
    where
        N: Into<String>,
        S: Into<String>,
        C: Into<String>,
        B: Into<String>,
    {
        Repository {
            name: name.into(),
            ssh_url: ssh_url.into(),
            clone_url: clone_url.into(),
            requested_branch: requested_branch.into(),
        }
    }
}
