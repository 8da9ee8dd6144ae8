use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test};
use blog_server::data::memory::MemoryStore;
use blog_server::data::user_repository::UserRepository;
use blog_server::domain::user::User;
use blog_server::infrastructure::cache::MemoryPageCache;
use blog_server::infrastructure::security::JwtKeys;
use blog_server::presentation::app::{Repositories, Services, configure_api};
use blog_server::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use serde_json::{Value, json};

struct TestEnv {
    store: MemoryStore,
    keys: JwtKeys,
    services: Services,
}

impl TestEnv {
    fn new() -> Self {
        let store = MemoryStore::new();
        let keys = JwtKeys::new("test-secret".into(), 3600);
        let services = Services::new(
            Repositories::memory(store.clone()),
            keys.clone(),
            vec!["admin".into()],
            Arc::new(MemoryPageCache::new()),
            Duration::from_secs(60),
        );
        Self {
            store,
            keys,
            services,
        }
    }

    /// Inserts a user directly and returns it with a ready `Authorization` value.
    async fn user(&self, username: &str, is_admin: bool) -> (User, String) {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused-hash".to_string(),
            is_admin,
        );
        let user = UserRepository::create(&self.store, user).await.unwrap();
        let token = self.keys.generate_token(user.id).unwrap();
        (user, format!("Bearer {token}"))
    }
}

macro_rules! app {
    ($env:expr) => {
        test::init_service(App::new().configure(|cfg| configure_api(cfg, &$env.services))).await
    };
}

macro_rules! publish {
    ($app:expr, $auth:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, $auth.clone()))
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let post: Value = test::read_body_json(resp).await;
        post
    }};
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn health_is_public() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn register_and_login_issue_tokens() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "Mark",
            "email": "Mark@mark.com",
            "password": "1234passs",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "Mark");
    assert!(body["user"].get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "login": "Mark", "password": "1234passs" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "login": "Mark", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn anonymous_writes_redirect_to_login() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "text": "anonymous" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/api/auth/login?next=%2Fapi%2Fposts");

    let req = test::TestRequest::get()
        .uri("/api/follow/posts?page=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/api/auth/login?next=%2Fapi%2Ffollow%2Fposts%3Fpage%3D2"
    );

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 0);
}

#[actix_web::test]
async fn login_redirect_keeps_every_query_parameter() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::get()
        .uri("/api/follow/posts?page=2&x=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let location = location(&resp);
    let (path, query) = location.split_once('?').unwrap();
    assert_eq!(path, "/api/auth/login");
    let params: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    assert_eq!(
        params,
        vec![("next".to_string(), "/api/follow/posts?page=2&x=1".to_string())]
    );
}

#[actix_web::test]
async fn unknown_routes_are_not_found_for_anyone() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;

    let req = test::TestRequest::get().uri("/api/nope").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::post().uri("/api/nope").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/api/nope")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn rejected_requests_still_pass_outer_middleware() {
    let env = TestEnv::new();
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(|cfg| configure_api(cfg, &env.services)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("x-request-id", "req-42"))
        .set_json(json!({ "text": "anonymous" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-42");
    assert!(resp.headers().contains_key("server-timing"));

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .set_json(json!({ "text": "text" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));
    assert!(resp.headers().contains_key("server-timing"));
}

#[actix_web::test]
async fn bad_token_is_unauthorized() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .set_json(json!({ "text": "text" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_with_group_redirects_to_profile() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, admin) = env.user("admin", true).await;
    let (author, auth) = env.user("mark", false).await;

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .set_json(json!({
            "title": "Test group",
            "slug": "test-slug",
            "description": "Test description",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({ "text": "T", "group_id": group["id"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/api/profiles/mark/posts");
    let post: Value = test::read_body_json(resp).await;
    assert_eq!(post["text"], "T");
    assert_eq!(post["group_id"], group["id"]);
    assert_eq!(post["author_id"], json!(author.id));

    let req = test::TestRequest::get()
        .uri("/api/groups/test-slug/posts")
        .to_request();
    let feed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(feed["page"]["total"], 1);
    assert_eq!(feed["group"]["slug"], "test-slug");
}

#[actix_web::test]
async fn only_admins_manage_groups() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({ "title": "Cats", "slug": "cats" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn empty_post_text_is_rejected_with_input() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({ "text": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"]["field"], "text");
    assert_eq!(body["details"]["input"], "   ");
}

#[actix_web::test]
async fn empty_comment_is_not_saved() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;
    let post = publish!(app, auth, json!({ "text": "post" }));
    let id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/comments"))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({ "text": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/comments"))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({ "text": "Комментарий" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/api/posts/{id}"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    let comments = detail["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "Комментарий");
}

#[actix_web::test]
async fn anonymous_comment_is_not_saved() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;
    let post = publish!(app, auth, json!({ "text": "post" }));
    let id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/comments"))
        .set_json(json!({ "text": "drive-by" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/api/auth/login"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert!(detail["comments"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn non_author_edit_redirects_without_change() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, author) = env.user("mark", false).await;
    let (_, stranger) = env.user("stranger", false).await;
    let post = publish!(app, author, json!({ "text": "original" }));
    let id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header((header::AUTHORIZATION, stranger))
        .set_json(json!({ "text": "hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/api/posts/{id}"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["text"], "original");

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header((header::AUTHORIZATION, author))
        .set_json(json!({ "text": "edited" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["post"]["text"], "edited");
    assert_eq!(detail["post"]["created_at"], post["created_at"]);
}

#[actix_web::test]
async fn delete_is_author_only() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, author) = env.user("mark", false).await;
    let (_, stranger) = env.user("stranger", false).await;
    let post = publish!(app, author, json!({ "text": "bye" }));
    let id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header((header::AUTHORIZATION, stranger))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header((header::AUTHORIZATION, author))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn global_feed_pages_and_clamps() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;
    for i in 1..=13 {
        publish!(app, auth, json!({ "text": format!("post {i}") }));
    }

    let cases = [
        ("/api/posts", 1, 10),
        ("/api/posts?page=2", 2, 3),
        ("/api/posts?page=abc", 1, 10),
        ("/api/posts?page=99", 2, 3),
        ("/api/posts?page=-1", 2, 3),
    ];
    for (uri, number, len) in cases {
        let req = test::TestRequest::get().uri(uri).to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["number"], number, "{uri}");
        assert_eq!(page["items"].as_array().unwrap().len(), len, "{uri}");
        assert_eq!(page["num_pages"], 2, "{uri}");
    }
}

#[actix_web::test]
async fn follow_flow_shapes_profile_and_feed() {
    let env = TestEnv::new();
    let app = app!(env);
    let (reader, reader_auth) = env.user("reader", false).await;
    let (author, author_auth) = env.user("auth", false).await;
    let (_, other_auth) = env.user("other", false).await;
    for i in 1..=3 {
        publish!(app, author_auth, json!({ "text": format!("followed {i}") }));
    }
    publish!(app, other_auth, json!({ "text": "not followed" }));

    let req = test::TestRequest::get()
        .uri("/api/follow/posts")
        .insert_header((header::AUTHORIZATION, reader_auth.clone()))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert!(page["items"].as_array().unwrap().is_empty());

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/profiles/auth/follow")
            .insert_header((header::AUTHORIZATION, reader_auth.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/api/profiles/auth/posts");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["following"], true);
    }

    let req = test::TestRequest::get()
        .uri("/api/follow/posts")
        .insert_header((header::AUTHORIZATION, reader_auth.clone()))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|p| p["author_id"] == json!(author.id)));

    let req = test::TestRequest::get()
        .uri("/api/profiles/auth/posts")
        .insert_header((header::AUTHORIZATION, reader_auth.clone()))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["following"], true);

    let req = test::TestRequest::get()
        .uri("/api/profiles/auth/posts")
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["following"], false);

    let req = test::TestRequest::post()
        .uri("/api/profiles/reader/follow")
        .insert_header((header::AUTHORIZATION, reader_auth.clone()))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["following"], false);
    assert_eq!(body["author"]["id"], json!(reader.id));

    let req = test::TestRequest::post()
        .uri("/api/profiles/auth/unfollow")
        .insert_header((header::AUTHORIZATION, reader_auth.clone()))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["following"], false);

    let req = test::TestRequest::get()
        .uri("/api/follow/posts")
        .insert_header((header::AUTHORIZATION, reader_auth))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 0);
}

#[actix_web::test]
async fn unknown_resources_are_not_found() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("mark", false).await;

    for uri in [
        "/api/groups/missing/posts",
        "/api/profiles/ghost/posts",
        "/api/posts/00000000-0000-0000-0000-000000000000",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND,
            "{uri}"
        );
    }

    let req = test::TestRequest::post()
        .uri("/api/profiles/ghost/follow")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn global_feed_is_cached_until_cleared() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, admin) = env.user("admin", true).await;
    let (_, auth) = env.user("mark", false).await;
    publish!(app, auth, json!({ "text": "stays" }));
    let doomed = publish!(app, auth, json!({ "text": "goes away" }));

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let before: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", doomed["id"].as_str().unwrap()))
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let cached: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cached, before);

    let req = test::TestRequest::post()
        .uri("/api/cache/clear")
        .insert_header((header::AUTHORIZATION, admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let fresh: Value = test::call_and_read_body_json(&app, req).await;
    assert_ne!(fresh, before);
    assert_eq!(fresh["total"], 1);
}
