pub mod client {
    use anyhow::Result;
    use lingo_common::{
        ErrorBody, FriendRequest, FriendRequestsSummary, FriendView, NewUser, NotificationView,
        PresenceEvent, ProfileUpdate, ReconcileReport, RequestId, RequestWithRecipient, UserId,
        UserView,
    };
    use reqwest::{Client, Response};

    /// A rejection from the server, carrying the machine-readable kind
    /// so callers can branch on it (`error.downcast_ref::<ApiFailure>()`).
    #[derive(Debug, Clone)]
    pub struct ApiFailure(pub ErrorBody);

    impl std::fmt::Display for ApiFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}: {}", self.0.error, self.0.message)
        }
    }
    impl std::error::Error for ApiFailure {}

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(ApiFailure(response.json().await?).into())
        }
    }

    async fn check(response: Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiFailure(response.json().await?).into())
        }
    }

    pub async fn create_user(client: &Client, base: &str, user: &NewUser) -> Result<UserView> {
        parse(client.post(format!("{base}/users")).json(user).send().await?).await
    }

    pub async fn update_profile(
        client: &Client,
        base: &str,
        actor: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserView> {
        parse(
            client
                .put(format!("{base}/{}/profile", actor.0))
                .json(update)
                .send()
                .await?,
        )
        .await
    }

    pub async fn recommended(client: &Client, base: &str, actor: &UserId) -> Result<Vec<UserView>> {
        parse(
            client
                .get(format!("{base}/{}/recommended", actor.0))
                .send()
                .await?,
        )
        .await
    }

    pub async fn friends(client: &Client, base: &str, actor: &UserId) -> Result<Vec<FriendView>> {
        parse(
            client
                .get(format!("{base}/{}/friends", actor.0))
                .send()
                .await?,
        )
        .await
    }

    pub async fn send_friend_request(
        client: &Client,
        base: &str,
        actor: &UserId,
        target: &UserId,
    ) -> Result<FriendRequest> {
        parse(
            client
                .post(format!("{base}/{}/friend-request/{}", actor.0, target.0))
                .send()
                .await?,
        )
        .await
    }

    pub async fn accept_friend_request(
        client: &Client,
        base: &str,
        actor: &UserId,
        request: &RequestId,
    ) -> Result<()> {
        check(
            client
                .put(format!(
                    "{base}/{}/friend-request/{}/accept",
                    actor.0, request.0
                ))
                .send()
                .await?,
        )
        .await
    }

    pub async fn friend_requests(
        client: &Client,
        base: &str,
        actor: &UserId,
    ) -> Result<FriendRequestsSummary> {
        parse(
            client
                .get(format!("{base}/{}/friend-requests", actor.0))
                .send()
                .await?,
        )
        .await
    }

    pub async fn outgoing_friend_requests(
        client: &Client,
        base: &str,
        actor: &UserId,
    ) -> Result<Vec<RequestWithRecipient>> {
        parse(
            client
                .get(format!("{base}/{}/outgoing-friend-requests", actor.0))
                .send()
                .await?,
        )
        .await
    }

    pub async fn notifications(
        client: &Client,
        base: &str,
        actor: &UserId,
    ) -> Result<Vec<NotificationView>> {
        parse(
            client
                .get(format!("{base}/{}/notifications", actor.0))
                .send()
                .await?,
        )
        .await
    }

    pub async fn reconcile(client: &Client, base: &str) -> Result<ReconcileReport> {
        parse(client.post(format!("{base}/admin/reconcile")).send().await?).await
    }

    pub async fn push_presence_event(
        client: &Client,
        base: &str,
        event: &PresenceEvent,
    ) -> Result<()> {
        check(
            client
                .post(format!("{base}/presence/event"))
                .json(event)
                .send()
                .await?,
        )
        .await
    }
}
