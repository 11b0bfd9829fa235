use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use forkpurge::config::Config;
use forkpurge::github::{self, Forge, Repo};
use forkpurge::purge;


/// In-memory account: listing pages plus a record of every call made.
struct Account {
    pages: Vec<Vec<Repo>>,
    page_count_status: Option<reqwest::StatusCode>,
    deletion_delay: Option<Duration>,
    listed: Mutex<Vec<u32>>,
    deleted: Mutex<Vec<String>>,
}

impl Account {
    fn new(pages: Vec<Vec<Repo>>) -> Self {
        Account {
            pages,
            page_count_status: None,
            deletion_delay: None,
            listed: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

impl Forge for Account {
    async fn page_count(&self) -> Result<u32, github::Error> {
        match self.page_count_status {
            Some(status) => Err(github::Error::Status {
                status,
                url: "https://api.github.test/users/octocat/repos".to_owned(),
            }),
            None => Ok(self.pages.len().max(1) as u32),
        }
    }

    async fn repos_page(&self, page: u32) -> Result<Vec<Repo>, github::Error> {
        self.listed.lock().unwrap().push(page);

        Ok(
            self.pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default()
        )
    }

    async fn delete_repo(&self, url: &str) -> Result<(), github::Error> {
        if let Some(delay) = self.deletion_delay {
            tokio::time::sleep(delay).await;
        }

        self.deleted.lock().unwrap().push(url.to_owned());

        Ok(())
    }
}


fn repo(name: &str, fork: bool, age: chrono::Duration) -> Repo {
    Repo {
        url: format!("https://api.github.test/repos/octocat/{}", name),
        fork,
        updated_at: (Utc::now() - age).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    }
}

fn config(older_than_days: u32, timeout: Option<Duration>) -> Config {
    Config {
        username: "octocat".to_owned(),
        api_token: "secret".to_owned(),
        api_url: "https://api.github.test".to_owned(),
        older_than_days,
        timeout,
    }
}


#[tokio::test]
async fn deletes_only_stale_forks() {
    let account = Account::new(vec![
        vec![
            repo("old-fork", true, chrono::Duration::days(90)),
            repo("new-fork", true, chrono::Duration::days(10)),
            repo("old-source", false, chrono::Duration::days(200)),
        ],
    ]);

    let report = purge::run(&account, &config(60, None)).await.unwrap();

    assert_eq!(
        report.deleted,
        vec!["https://api.github.test/repos/octocat/old-fork".to_owned()],
    );
    assert_eq!(*account.deleted.lock().unwrap(), report.deleted);
}

#[tokio::test]
async fn zero_threshold_deletes_recent_forks() {
    let account = Account::new(vec![
        vec![repo("fresh", true, chrono::Duration::seconds(1))],
    ]);

    let report = purge::run(&account, &config(0, None)).await.unwrap();

    assert_eq!(report.deleted.len(), 1);
}

#[tokio::test]
async fn lists_every_page_and_unions_results() {
    let account = Account::new(vec![
        vec![repo("a", true, chrono::Duration::days(61))],
        vec![repo("b", false, chrono::Duration::days(61))],
        vec![repo("c", true, chrono::Duration::days(400))],
        vec![repo("d", true, chrono::Duration::days(59))],
    ]);

    let mut report = purge::run(&account, &config(60, None)).await.unwrap();
    report.deleted.sort();

    assert_eq!(*account.listed.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(
        report.deleted,
        vec![
            "https://api.github.test/repos/octocat/a".to_owned(),
            "https://api.github.test/repos/octocat/c".to_owned(),
        ],
    );
}

#[tokio::test]
async fn no_candidates_is_a_successful_no_op() {
    let account = Account::new(vec![
        vec![
            repo("source", false, chrono::Duration::days(365)),
            repo("active-fork", true, chrono::Duration::days(1)),
        ],
    ]);

    let report = purge::run(&account, &config(60, Some(Duration::ZERO)))
        .await
        .unwrap();

    assert!(report.deleted.is_empty());
    assert!(account.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn listing_failure_deletes_nothing() {
    let mut account = Account::new(vec![
        vec![repo("old-fork", true, chrono::Duration::days(90))],
    ]);
    account.page_count_status = Some(reqwest::StatusCode::UNAUTHORIZED);

    let result = purge::run(&account, &config(60, None)).await;

    assert!(matches!(
        result,
        Err(purge::Error::Listing(github::Error::Status { .. })),
    ));
    assert!(account.listed.lock().unwrap().is_empty());
    assert!(account.deleted.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_bounds_deletion_phase() {
    let mut account = Account::new(vec![
        vec![
            repo("a", true, chrono::Duration::days(90)),
            repo("b", true, chrono::Duration::days(90)),
        ],
    ]);
    account.deletion_delay = Some(Duration::from_secs(30));

    let result = purge::run(&account, &config(60, Some(Duration::from_secs(5)))).await;

    assert!(matches!(
        result,
        Err(purge::Error::DeadlineExceeded { outstanding: 2, .. }),
    ));
    assert!(account.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn huge_timeout_from_environment_does_not_abort_run() {
    let config = Config::from_vars(|name| match name {
        "GITHUB_USERNAME" => Some("octocat".to_owned()),
        "GITHUB_API_TOKEN" => Some("secret".to_owned()),
        "TIMEOUT" => Some("1e19".to_owned()),
        _ => None,
    }).unwrap();
    assert!(config.timeout.is_some());

    let account = Account::new(vec![
        vec![repo("old-fork", true, chrono::Duration::days(90))],
    ]);

    let report = purge::run(&account, &config).await.unwrap();

    assert_eq!(report.deleted.len(), 1);
}
