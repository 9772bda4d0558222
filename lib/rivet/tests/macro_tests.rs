//! `#[rivet::service]` clients against a wiremock server.

use assert2::{check, let_assert};
use rivet::prelude::*;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize)]
struct NewUser {
    name: String,
}

/// Users of the test server.
#[rivet::service]
#[headers("Accept: application/json")]
pub trait UserApi {
    #[get("/users/{id}")]
    async fn get_user(&self, id: u64) -> rivet::Result<User>;

    #[get("/users")]
    async fn search(
        &self,
        #[query("q")] term: &str,
        #[header] x_trace_id: &str,
    ) -> rivet::Result<Vec<User>>;

    #[post("/users")]
    fn create_user(&self, user: NewUser) -> rivet::Result<Deferred<User>>;

    #[http("POST /login")]
    async fn login(&self, #[field] username: &str, #[field] password: &str) -> rivet::Result<()>;

    #[delete("/users/{id}")]
    #[headers("X-Confirm: yes")]
    async fn delete_user(&self, id: u64) -> rivet::Result<()>;
}

#[rivet::service(name = "Health")]
pub trait HealthApi {
    #[get("/health")]
    async fn check(&self) -> rivet::Result<String>;
}

fn ada() -> User {
    User {
        id: 42,
        name: "Ada".to_string(),
    }
}

fn client(server: &MockServer) -> UserApiClient {
    Rivet::builder()
        .base_url(server.uri())
        .without_cache()
        .build()
        .expect("rivet")
        .create()
        .expect("client")
}

#[tokio::test]
async fn get_with_path_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ada()))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server);
    let user = users.get_user(42).await.expect("user");
    check!(user == ada());
}

#[tokio::test]
async fn query_and_header_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("q", "ada lovelace"))
        .and(header("x-trace-id", "abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![ada()]))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server);
    let found = users.search("ada lovelace", "abc-123").await.expect("users");
    check!(found == [ada()]);
}

#[tokio::test]
async fn deferred_body_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({"name": "Ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(ada()))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server);
    let deferred = users
        .create_user(NewUser {
            name: "Ada".to_string(),
        })
        .expect("deferred");
    let user = deferred.await.expect("created");
    check!(user == ada());
}

#[tokio::test]
async fn form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("username=ada&password=analytical%20engine"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server);
    users
        .login("ada", "analytical engine")
        .await
        .expect("logged in");
}

#[tokio::test]
async fn method_headers_add_to_service_headers() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/42"))
        .and(header("Accept", "application/json"))
        .and(header("X-Confirm", "yes"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server);
    users.delete_user(42).await.expect("deleted");
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .mount(&server)
        .await;

    let users = client(&server);
    let_assert!(Err(err) = users.get_user(7).await);
    check!(err.status() == Some(404));
    check!(err.body().map(|body| body.as_ref()) == Some(&b"no such user"[..]));
}

#[tokio::test]
async fn service_name_and_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json("ok"))
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join(format!("rivet-macro-tests-{}", std::process::id()));
    let rivet = Rivet::builder()
        .base_url(server.uri())
        .cache_dir(&dir)
        .build()
        .expect("rivet");

    let health: HealthApiClient = rivet.create().expect("client");
    check!(health.service().name() == "Health");
    check!(health.check().await.expect("status") == "ok");

    let_assert!(Ok(listing) = std::fs::read_to_string(dir.join("Health.rivet")));
    check!(listing.contains("fn check -> String\n    GET /health\n"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn declaration_reflects_the_trait() {
    let declaration = UserApiClient::declaration();
    check!(declaration.name() == "UserApi");

    let names: Vec<_> = declaration.methods().iter().map(rivet::MethodDeclaration::name).collect();
    check!(names == ["get_user", "search", "create_user", "login", "delete_user"]);

    let_assert!(Some(search) = declaration.methods().get(1));
    let parameters: Vec<_> = search
        .parameters()
        .iter()
        .map(|p| (p.name(), p.ty().as_str()))
        .collect();
    check!(parameters == [("term", "&str"), ("x_trace_id", "&str")]);
    check!(search.return_type().as_str() == "Vec<User>");
}
