use crate::classifier::ClassifyFailure;
use futures::future::BoxFuture;

/// A pooled connection factory the gate can lease from and probe.
///
/// Production code implements this over a real pool (`aula-db-pool`'s
/// `PoolManager`); tests implement it over in-memory scripts.
pub trait ConnectionSource: Send + Sync {
    /// The leased connection. Dropping it must return it to the pool on
    /// every exit path; that drop is the release half of scoped
    /// acquisition.
    type Conn: Send + 'static;

    /// Source error, classifiable into the gate's failure taxonomy.
    type Error: ClassifyFailure + Send + 'static;

    /// Leases one connection. May block up to the source's own pool
    /// timeout before failing.
    fn lease(&self) -> BoxFuture<'_, Result<Self::Conn, Self::Error>>;

    /// Cheap liveness check against a freshly leased connection.
    fn probe<'a>(&'a self, conn: &'a mut Self::Conn) -> BoxFuture<'a, Result<(), Self::Error>>;

    /// Disposes of a connection judged dead so it is not reused. The
    /// default implementation just drops it.
    fn discard(&self, conn: Self::Conn) -> BoxFuture<'_, ()> {
        Box::pin(async move { drop(conn) })
    }
}
