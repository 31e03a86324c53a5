use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GithubLink {
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubPullLinks {
    pub issue: GithubLink,
}

#[derive(Debug, Deserialize)]
pub struct GithubBranchRef {
    #[serde(rename = "ref")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubPullRequest {
    pub title: String,
    pub body: Option<String>,
    pub created_at: String,
    pub base: GithubBranchRef,
    #[serde(rename = "_links")]
    pub links: GithubPullLinks,
}

/// Error payload returned by the API on failures
#[derive(Debug, Deserialize)]
pub struct GithubErrorMessage {
    pub message: String,
}
