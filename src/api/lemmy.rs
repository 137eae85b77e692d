//! Lemmy API client (HTTP API v3)

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::{Account, Author, FeedItem, ItemKind, UnreadCounts};

use super::{ApiError, InboxApi, ListQuery};

/// Lemmy API client
pub struct LemmyClient {
    client: Client,
    instance: String,
    jwt: Option<String>,
}

impl LemmyClient {
    /// Create a new client, optionally authenticated
    pub fn new(instance: &str, jwt: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            instance: instance.trim_end_matches('/').to_string(),
            jwt: jwt.map(ToString::to_string),
        }
    }

    /// Instance base URL
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Build API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v3{}", self.instance, endpoint)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.jwt {
            Some(jwt) => request.bearer_auth(jwt),
            None => request,
        }
    }

    /// Exchange a username and password for a token
    pub async fn login(instance: &str, username_or_email: &str, password: &str) -> Result<String> {
        let client = Self::new(instance, None);
        let response = client
            .client
            .post(client.api_url("/user/login"))
            .json(&json!({
                "username_or_email": username_or_email,
                "password": password,
            }))
            .send()
            .await
            .context("Failed to log in")?;

        let login: LoginResponse = decode(check(response).await?).await?;
        login
            .jwt
            .context("Login succeeded but no token was issued (email verification or approval pending?)")
    }

    /// Verify the token and get account info
    pub async fn verify(&self) -> Result<Account> {
        let response = self
            .authorized(self.client.get(self.api_url("/site")))
            .send()
            .await
            .context("Failed to fetch site")?;

        let site: SiteResponse = decode(check(response).await?).await?;
        let person = site
            .my_user
            .ok_or(ApiError::Unauthorized)?
            .local_user_view
            .person;

        let display_name = person.display_name.clone().unwrap_or_else(|| person.name.clone());
        let mut account = Account::new(&person.name, &self.instance, &display_name);
        account.is_default = true;
        Ok(account)
    }
}

impl InboxApi for LemmyClient {
    async fn list(&self, query: &ListQuery) -> Result<Vec<FeedItem>, ApiError> {
        let endpoint = match query.kind {
            ItemKind::Reply => "/user/replies",
            ItemKind::Mention => "/user/mention",
            ItemKind::Message => "/private_message/list",
            ItemKind::PostReport => "/post/report/list",
            ItemKind::CommentReport => "/comment/report/list",
        };

        let params = ListParams::from_query(query);
        let mut request = self
            .authorized(self.client.get(self.api_url(endpoint)))
            .query(&params);
        if query.force_refresh {
            request = request.header(reqwest::header::CACHE_CONTROL, "no-cache");
        }

        tracing::debug!(kind = %query.kind, page = query.page, "fetching inbox page");
        let response = check(request.send().await?).await?;

        let items = match query.kind {
            ItemKind::Reply => decode::<RepliesResponse>(response)
                .await?
                .replies
                .into_iter()
                .map(CommentReplyView::into_item)
                .collect(),
            ItemKind::Mention => decode::<MentionsResponse>(response)
                .await?
                .mentions
                .into_iter()
                .map(PersonMentionView::into_item)
                .collect(),
            ItemKind::Message => decode::<PrivateMessagesResponse>(response)
                .await?
                .private_messages
                .into_iter()
                .map(PrivateMessageView::into_item)
                .collect(),
            ItemKind::PostReport => decode::<PostReportsResponse>(response)
                .await?
                .post_reports
                .into_iter()
                .map(PostReportView::into_item)
                .collect(),
            ItemKind::CommentReport => decode::<CommentReportsResponse>(response)
                .await?
                .comment_reports
                .into_iter()
                .map(CommentReportView::into_item)
                .collect(),
        };

        Ok(items)
    }

    async fn mark_as_read(&self, item: &FeedItem, read: bool) -> Result<(), ApiError> {
        let request = match item.kind {
            ItemKind::Reply => self
                .client
                .post(self.api_url("/comment/mark_as_read"))
                .json(&json!({ "comment_reply_id": item.id, "read": read })),
            ItemKind::Mention => self
                .client
                .post(self.api_url("/user/mention/mark_as_read"))
                .json(&json!({ "person_mention_id": item.id, "read": read })),
            ItemKind::Message => self
                .client
                .post(self.api_url("/private_message/mark_as_read"))
                .json(&json!({ "private_message_id": item.id, "read": read })),
            ItemKind::PostReport => self
                .client
                .put(self.api_url("/post/report/resolve"))
                .json(&json!({ "report_id": item.id, "resolved": read })),
            ItemKind::CommentReport => self
                .client
                .put(self.api_url("/comment/report/resolve"))
                .json(&json!({ "report_id": item.id, "resolved": read })),
        };

        check(self.authorized(request).send().await?).await?;
        Ok(())
    }

    async fn unread_count(&self) -> Result<UnreadCounts, ApiError> {
        let response = self
            .authorized(self.client.get(self.api_url("/user/unread_count")))
            .send()
            .await?;

        decode(check(response).await?).await
    }
}

/// Map status codes onto the error taxonomy
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        // Lemmy reports auth problems as 400 with an error code in the body
        if body.contains("not_logged_in") || body.contains("incorrect_login") {
            return Err(ApiError::Unauthorized);
        }
        return Err(ApiError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Parse a Lemmy timestamp
///
/// Newer servers send RFC 3339; older ones send naive UTC timestamps.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    tracing::warn!(raw, "unparseable timestamp, sorting as epoch");
    DateTime::<Utc>::default()
}

fn last_update(published: &str, updated: Option<&str>) -> DateTime<Utc> {
    parse_timestamp(updated.unwrap_or(published))
}

/// Host of an ActivityPub actor id (`https://lemmy.ml/u/alice` -> `lemmy.ml`)
fn instance_of(actor_id: &str) -> String {
    actor_id
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

// ==================== API Types ====================

#[derive(Debug, Serialize)]
struct ListParams {
    page: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unread_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unresolved_only: Option<bool>,
}

impl ListParams {
    fn from_query(query: &ListQuery) -> Self {
        Self {
            page: query.page,
            limit: query.limit,
            sort: query.kind.honors_sort().then(|| query.sort.as_str()),
            unread_only: (!query.kind.is_report()).then_some(query.unread_only),
            unresolved_only: query.kind.is_report().then_some(query.unread_only),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    jwt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteResponse {
    my_user: Option<MyUserInfo>,
}

#[derive(Debug, Deserialize)]
struct MyUserInfo {
    local_user_view: LocalUserView,
}

#[derive(Debug, Deserialize)]
struct LocalUserView {
    person: LemmyPerson,
}

#[derive(Debug, Deserialize)]
struct LemmyPerson {
    id: i64,
    name: String,
    display_name: Option<String>,
    actor_id: String,
}

impl LemmyPerson {
    fn into_author(self) -> Author {
        Author {
            id: self.id,
            instance: instance_of(&self.actor_id),
            name: self.name,
            display_name: self.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LemmyComment {
    id: i64,
    content: String,
    published: String,
    updated: Option<String>,
    path: String,
}

#[derive(Debug, Deserialize)]
struct LemmyPost {
    id: i64,
    name: String,
}

/// Shared shape of `comment_reply` and `person_mention`
#[derive(Debug, Deserialize)]
struct InboxLink {
    id: i64,
    read: bool,
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    replies: Vec<CommentReplyView>,
}

#[derive(Debug, Deserialize)]
struct CommentReplyView {
    comment_reply: InboxLink,
    comment: LemmyComment,
    creator: LemmyPerson,
    post: LemmyPost,
}

impl CommentReplyView {
    fn into_item(self) -> FeedItem {
        comment_item(
            ItemKind::Reply,
            self.comment_reply,
            self.comment,
            self.creator,
            self.post,
        )
    }
}

#[derive(Debug, Deserialize)]
struct MentionsResponse {
    mentions: Vec<PersonMentionView>,
}

#[derive(Debug, Deserialize)]
struct PersonMentionView {
    person_mention: InboxLink,
    comment: LemmyComment,
    creator: LemmyPerson,
    post: LemmyPost,
}

impl PersonMentionView {
    fn into_item(self) -> FeedItem {
        comment_item(
            ItemKind::Mention,
            self.person_mention,
            self.comment,
            self.creator,
            self.post,
        )
    }
}

fn comment_item(
    kind: ItemKind,
    link: InboxLink,
    comment: LemmyComment,
    creator: LemmyPerson,
    post: LemmyPost,
) -> FeedItem {
    FeedItem {
        id: link.id,
        kind,
        author: creator.into_author(),
        title: post.name,
        content: comment.content,
        last_update: last_update(&comment.published, comment.updated.as_deref()),
        is_read: link.read,
        comment_id: Some(comment.id),
        comment_path: Some(comment.path),
        post_id: Some(post.id),
    }
}

#[derive(Debug, Deserialize)]
struct PrivateMessagesResponse {
    private_messages: Vec<PrivateMessageView>,
}

#[derive(Debug, Deserialize)]
struct PrivateMessageView {
    private_message: LemmyPrivateMessage,
    creator: LemmyPerson,
}

#[derive(Debug, Deserialize)]
struct LemmyPrivateMessage {
    id: i64,
    content: String,
    read: bool,
    published: String,
    updated: Option<String>,
}

impl PrivateMessageView {
    fn into_item(self) -> FeedItem {
        let author = self.creator.into_author();
        FeedItem {
            id: self.private_message.id,
            kind: ItemKind::Message,
            title: format!("Message from {}", author.label()),
            author,
            content: self.private_message.content,
            last_update: last_update(
                &self.private_message.published,
                self.private_message.updated.as_deref(),
            ),
            is_read: self.private_message.read,
            comment_id: None,
            comment_path: None,
            post_id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostReportsResponse {
    post_reports: Vec<PostReportView>,
}

#[derive(Debug, Deserialize)]
struct PostReportView {
    post_report: LemmyPostReport,
    post: LemmyPost,
    creator: LemmyPerson,
}

#[derive(Debug, Deserialize)]
struct LemmyPostReport {
    id: i64,
    original_post_name: String,
    reason: String,
    resolved: bool,
    published: String,
    updated: Option<String>,
}

impl PostReportView {
    fn into_item(self) -> FeedItem {
        let report = self.post_report;
        FeedItem {
            id: report.id,
            kind: ItemKind::PostReport,
            author: self.creator.into_author(),
            title: report.original_post_name,
            content: report.reason,
            last_update: last_update(&report.published, report.updated.as_deref()),
            is_read: report.resolved,
            comment_id: None,
            comment_path: None,
            post_id: Some(self.post.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentReportsResponse {
    comment_reports: Vec<CommentReportView>,
}

#[derive(Debug, Deserialize)]
struct CommentReportView {
    comment_report: LemmyCommentReport,
    comment: LemmyComment,
    post: LemmyPost,
    creator: LemmyPerson,
}

#[derive(Debug, Deserialize)]
struct LemmyCommentReport {
    id: i64,
    original_comment_text: String,
    reason: String,
    resolved: bool,
    published: String,
    updated: Option<String>,
}

impl CommentReportView {
    fn into_item(self) -> FeedItem {
        let report = self.comment_report;
        FeedItem {
            id: report.id,
            kind: ItemKind::CommentReport,
            author: self.creator.into_author(),
            title: report.original_comment_text,
            content: report.reason,
            last_update: last_update(&report.published, report.updated.as_deref()),
            is_read: report.resolved,
            comment_id: Some(self.comment.id),
            comment_path: Some(self.comment.path),
            post_id: Some(self.post.id),
        }
    }
}
