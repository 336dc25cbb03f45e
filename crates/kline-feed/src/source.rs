/*
[INPUT]:  Anything that can deliver feed events
[OUTPUT]: FeedSource trait used by consumers to subscribe, connect and close
[POS]:    Client layer - injection seam between feed and page
[UPDATE]: When consumers need more from the feed
*/

use crate::dispatch::Subscription;
use crate::types::FeedEvent;

/// A feed a page can subscribe to and, on teardown, close.
pub trait FeedSource {
    /// Register for lifecycle and data events. Drop the guard to deregister.
    fn subscribe(&self) -> Subscription<FeedEvent>;

    /// Start delivering events. Subscribe first: nothing is replayed to
    /// listeners registered later. No-op while already connected.
    fn connect(&self);

    /// Close the connection. Calling it again has no further effect.
    fn close(&self);
}
