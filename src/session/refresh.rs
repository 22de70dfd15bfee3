use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use parking_lot::Mutex;

use crate::client::ApiClient;
use crate::error::Error;
use crate::token::{TokenPair, unix_now};
use crate::types::PrincipalId;

type Call = BoxFuture<'static, Result<TokenPair, String>>;

/// One upstream call per principal and refresh token.
type CallKey = (PrincipalId, String);

/// Renews token pairs, collapsing concurrent refreshes of the same token pair.
///
/// The first caller starts the upstream call; anyone arriving with the same
/// principal and refresh token while it runs awaits the same result. The map
/// only holds weak handles: once every caller is gone, finished or cancelled,
/// the call is dropped and the next refresh starts a new one.
pub struct Refresher {
    api: Arc<ApiClient>,
    in_flight: Mutex<HashMap<CallKey, WeakShared<Call>>>,
}

impl Refresher {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// # Errors
    ///
    /// [`Error::RefreshFailure`] for any failure: transport, rejected or
    /// revoked refresh token, malformed response.
    pub async fn refresh(&self, principal: &PrincipalId, tokens: &TokenPair) -> Result<TokenPair, Error> {
        let key = (principal.clone(), tokens.refresh_token.clone());
        let call = {
            let mut in_flight = self.in_flight.lock();
            in_flight.retain(|_, call| call.upgrade().is_some());
            match in_flight.get(&key).and_then(WeakShared::upgrade) {
                Some(call) => call,
                None => {
                    let call = self.start(tokens.refresh_token.clone());
                    if let Some(weak) = call.downgrade() {
                        in_flight.insert(key.clone(), weak);
                    }
                    call
                }
            }
        };

        let result = call.clone().await;

        {
            let mut in_flight = self.in_flight.lock();
            let current = in_flight.get(&key).and_then(WeakShared::upgrade);
            if current.is_some_and(|c| c.ptr_eq(&call)) {
                in_flight.remove(&key);
            }
        }

        result.map_err(Error::RefreshFailure)
    }

    fn start(&self, refresh_token: String) -> Shared<Call> {
        let api = self.api.clone();
        async move {
            api.refresh_token(&refresh_token)
                .await
                .map(|response| TokenPair::issue(response, unix_now()))
                .map_err(|e| e.to_string())
        }
        .boxed()
        .shared()
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.in_flight
            .lock()
            .values()
            .filter(|call| call.upgrade().is_some())
            .count()
    }
}
