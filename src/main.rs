#[cfg(feature = "native")]
type Api = sms_portal::core::ApiClient<
    sms_portal::core::auth::FileStore,
    sms_portal::core::api::ReqwestTransport,
>;

#[cfg(feature = "native")]
const USAGE: &str = "\
usage: sms-portal <command>

commands:
  login <email> <password>             sign in and persist the session
  logout                               forget the persisted session
  whoami                               show the signed-in user
  list <students|teachers|courses> [search]
  export <students|teachers> [search]  print the list as CSV
  stats                                dashboard counts
  routes                               pages available to the signed-in user";

#[cfg(feature = "native")]
#[tokio::main]
async fn main() {
    use std::sync::Arc;

    use sms_portal::core::SessionManager;
    use sms_portal::core::api::ReqwestTransport;
    use sms_portal::core::auth::FileStore;
    use sms_portal::core::config::Config;
    use tracing_subscriber::EnvFilter;

    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Config loaded: api_base_url={}, request_timeout={}",
        config.has_api_base_url(),
        config.has_request_timeout()
    );
    tracing::debug!(
        "Resolved config: api_base_url={}, session_file={}, timeout={:?}",
        config.api_base_url(),
        config.session_file(),
        config.request_timeout()
    );

    let transport = match config.request_timeout() {
        Some(timeout) => match ReqwestTransport::with_timeout(timeout) {
            Ok(transport) => transport,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        },
        None => ReqwestTransport::new(),
    };

    let session = SessionManager::new(
        FileStore::new(config.session_file()),
        transport,
        config.api_base_url(),
    );
    session.initialize();
    let api = Api::new(Arc::new(session));

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(message) = run(&api, &args).await {
        eprintln!("error: {}", message);
        std::process::exit(1);
    }
}

#[cfg(feature = "native")]
async fn run(api: &Api, args: &[String]) -> Result<(), String> {
    use sms_portal::app::{Route, nav_links};
    use sms_portal::core::resources::DashboardStats;

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let session = api.session();

    match args.as_slice() {
        ["login", email, password] => {
            let user = session
                .login(email, password)
                .await
                .map_err(|e| e.user_message("Login failed"))?;
            println!("Signed in as {} ({})", user.full_name, user.role);
        }
        ["logout"] => {
            session.logout();
            println!("Signed out");
        }
        ["whoami"] => match session.current_user() {
            Some(user) => println!("{} <{}> {}", user.full_name, user.email.unwrap_or_default(), user.role),
            None => println!("Not signed in"),
        },
        ["list", kind, rest @ ..] => {
            require_user(api)?;
            let search = rest.join(" ");
            match *kind {
                "students" => list::<sms_portal::core::resources::Student>(api, &search, |s| {
                    format!(
                        "{:<10} {:<28} {:<32} grade {:<3} gpa {}",
                        s.student_id.as_deref().unwrap_or("-"),
                        s.full_name.as_deref().unwrap_or("-"),
                        s.email.as_deref().unwrap_or("-"),
                        s.grade.as_deref().unwrap_or("-"),
                        s.gpa.as_deref().unwrap_or("-"),
                    )
                })
                .await?,
                "teachers" => list::<sms_portal::core::resources::Teacher>(api, &search, |t| {
                    format!(
                        "{:<10} {:<28} {:<12} {}",
                        t.teacher_id.as_deref().unwrap_or("-"),
                        t.full_name.as_deref().unwrap_or("-"),
                        t.department.as_deref().unwrap_or("-"),
                        t.specialization.as_deref().unwrap_or("-"),
                    )
                })
                .await?,
                "courses" => list::<sms_portal::core::resources::Course>(api, &search, |c| {
                    format!(
                        "{:<10} {:<32} {:<24} {:>7} {}",
                        c.course_code.as_deref().unwrap_or("-"),
                        c.course_name.as_deref().unwrap_or("-"),
                        c.teacher_name(),
                        c.enrollment_label(),
                        c.status,
                    )
                })
                .await?,
                other => return Err(format!("unknown collection '{}'\n\n{}", other, USAGE)),
            }
        }
        ["export", kind, rest @ ..] => {
            require_user(api)?;
            let search = rest.join(" ");
            match *kind {
                "students" => export::<sms_portal::core::resources::Student>(api, &search).await?,
                "teachers" => export::<sms_portal::core::resources::Teacher>(api, &search).await?,
                other => return Err(format!("cannot export '{}'\n\n{}", other, USAGE)),
            }
        }
        ["stats"] => {
            let user = require_user(api)?;
            let stats = DashboardStats::load(api, user.role).await;
            println!("Welcome back, {}!", user.full_name);
            if user.role.is_staff() {
                println!("Students: {}", stats.students);
                println!("Teachers: {}", stats.teachers);
                println!("Courses:  {}", stats.courses);
            }
        }
        ["routes"] => {
            let user = require_user(api)?;
            for route in nav_links(user.role) {
                println!("{:<10} {}", route.to_string(), route.path());
            }
            for route in Route::ALL.into_iter().filter(|r| r.is_public()) {
                println!("{:<10} {}", route.to_string(), route.path());
            }
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}

#[cfg(feature = "native")]
fn require_user(api: &Api) -> Result<sms_portal::core::UserProfile, String> {
    api.session()
        .current_user()
        .ok_or_else(|| "not signed in; run `sms-portal login <email> <password>`".to_string())
}

#[cfg(feature = "native")]
async fn fetch<R>(api: &Api) -> Result<Vec<R>, String>
where
    R: sms_portal::core::resources::Resource,
{
    use sms_portal::core::resources::ResourceClient;

    type Client<R> = ResourceClient<
        R,
        sms_portal::core::auth::FileStore,
        sms_portal::core::api::ReqwestTransport,
    >;

    Client::<R>::new(api.clone()).list().await.map_err(|e| {
        if e.requires_reauthentication() {
            "session expired; please sign in again".to_string()
        } else {
            e.user_message(&Client::<R>::fetch_failed_message())
        }
    })
}

#[cfg(feature = "native")]
async fn list<R>(api: &Api, search: &str, render: impl Fn(&R) -> String) -> Result<(), String>
where
    R: sms_portal::core::resources::Resource + sms_portal::core::resources::Searchable,
{
    use sms_portal::core::resources::filter_by_search;

    let items = fetch::<R>(api).await?;
    let matching = filter_by_search(&items, search);
    if matching.is_empty() {
        println!("No {} found", R::LABEL);
    }
    for item in matching {
        println!("{}", render(item));
    }
    Ok(())
}

#[cfg(feature = "native")]
async fn export<R>(api: &Api, search: &str) -> Result<(), String>
where
    R: sms_portal::core::resources::Resource
        + sms_portal::core::resources::Searchable
        + sms_portal::core::resources::CsvRow,
{
    use sms_portal::core::resources::{filter_by_search, to_csv};

    let items = fetch::<R>(api).await?;
    println!("{}", to_csv(&filter_by_search(&items, search)));
    Ok(())
}

#[cfg(not(feature = "native"))]
pub fn main() {
    // the browser build has no entry point; see the `web` feature
}
