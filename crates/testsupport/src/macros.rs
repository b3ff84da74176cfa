//! Test setup macros for reducing boilerplate across the fixture test suite.

/// Creates a [`TestContext`](crate::context::TestContext) bound to a local.
///
/// # Syntax
///
/// ```text
/// test_db!(ctx)                                   // empty database
/// test_db!(ctx, schema: ["create table ...", ...])
/// test_db!(ctx, shop)                             // users and orders tables
/// test_db!(ctx, shop, config: some_config)
/// ```
///
/// # Examples
///
/// ```
/// use testsupport::test_db;
///
/// test_db!(ctx, schema: ["create table t (id integer, name text)"]);
/// ctx.db().execute_update("insert into t(id) values(1)").unwrap();
/// ```
///
/// ```
/// use testsupport::test_db;
///
/// test_db!(ctx, shop);
/// let mut users = ctx.table("users").unwrap();
/// assert!(users.get_all().unwrap().is_empty());
/// ```
#[macro_export]
macro_rules! test_db {
    ($ctx:ident) => {
        let $ctx = $crate::context::TestContext::new().unwrap();
    };

    ($ctx:ident, schema: [$($ddl:expr),+ $(,)?]) => {
        let $ctx = $crate::context::TestContext::with_schema(&[$($ddl),+]).unwrap();
    };

    ($ctx:ident, shop) => {
        let $ctx = $crate::context::TestContext::shop().unwrap();
    };

    ($ctx:ident, shop, config: $config:expr) => {
        let $ctx = $crate::context::TestContext::shop_with_config($config).unwrap();
    };
}
