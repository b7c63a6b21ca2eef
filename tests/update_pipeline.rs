use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use ufcstats_scraper::formats::{FIGHT_COLUMNS, FightResult};
use ufcstats_scraper::store::{FIGHT_STATS_FILE, FIGHTER_STATS_FILE, load_fighters, load_fights};

const LISTING_PATH: &str = "/statistics/events/completed?page=all";

type Hits = Arc<Mutex<HashMap<String, usize>>>;

struct Bout<'a> {
    id: &'a str,
    red: &'a str,
    blue: &'a str,
    draw: bool,
}

fn slug(name: &str) -> String {
    name.to_ascii_lowercase().replace(' ', "-")
}

fn listing_html(base: &str, events: &[&str]) -> String {
    let rows = events
        .iter()
        .map(|e| {
            format!(
                r#"<tr class="b-statistics__table-row"><td><i class="b-statistics__table-content"><a href="{base}/event-details/{e}" class="b-link b-link_style_black">{e}</a></i></td></tr>"#
            )
        })
        .collect::<String>();
    format!(
        r#"<!doctype html><html><body><table class="b-statistics__table-events"><thead><tr><th>Name/date</th></tr></thead><tbody>{rows}</tbody></table></body></html>"#
    )
}

fn event_html(base: &str, date: &str, bouts: &[Bout<'_>]) -> String {
    let rows = bouts
        .iter()
        .map(|bout| {
            let flag = r#"<p class="b-fight-details__table-text"><a class="b-flag"><i class="b-flag__text">x</i></a></p>"#;
            let flags = if bout.draw { format!("{flag}{flag}") } else { flag.to_owned() };
            format!(
                r#"<tr class="b-fight-details__table-row">
<td class="b-fight-details__table-col"><a href="{base}/fight-details/{id}"></a>{flags}</td>
<td class="b-fight-details__table-col">
<p class="b-fight-details__table-text"><a href="{base}/fighter-details/{red_slug}">{red}</a></p>
<p class="b-fight-details__table-text"><a href="{base}/fighter-details/{blue_slug}">{blue}</a></p>
</td>
<td class="b-fight-details__table-col"><p>0</p><p>0</p></td>
<td class="b-fight-details__table-col"><p>0</p><p>0</p></td>
<td class="b-fight-details__table-col"><p>0</p><p>0</p></td>
<td class="b-fight-details__table-col"><p>0</p><p>0</p></td>
<td class="b-fight-details__table-col"><p class="b-fight-details__table-text">Welterweight</p></td>
<td class="b-fight-details__table-col"><p class="b-fight-details__table-text">SUB</p><p class="b-fight-details__table-text">Rear Naked Choke</p></td>
<td class="b-fight-details__table-col"><p class="b-fight-details__table-text">1</p></td>
<td class="b-fight-details__table-col"><p class="b-fight-details__table-text">3:33</p></td>
</tr>"#,
                id = bout.id,
                red = bout.red,
                blue = bout.blue,
                red_slug = slug(bout.red),
                blue_slug = slug(bout.blue),
            )
        })
        .collect::<String>();
    format!(
        r#"<!doctype html><html><body>
<ul class="b-list__box-list">
  <li class="b-list__box-list-item">
    <i class="b-list__box-item-title">Date:</i>
    {date}
  </li>
</ul>
<table class="b-fight-details__table">
<thead><tr class="b-fight-details__table-row"><th>W/L</th></tr></thead>
<tbody>{rows}</tbody>
</table>
</body></html>"#
    )
}

fn stat_col(a: &str, b: &str) -> String {
    format!(r#"<td class="b-fight-details__table-col"><p>{a}</p><p>{b}</p></td>"#)
}

fn bout_html(red: &str, blue: &str) -> String {
    let totals = [
        stat_col(red, blue),
        stat_col("0", "1"),
        stat_col("12 of 30", "25 of 40"),
        stat_col("40%", "62%"),
        stat_col("14 of 33", "31 of 47"),
        stat_col("0 of 2", "1 of 1"),
        stat_col("0%", "100%"),
        stat_col("0", "2"),
        stat_col("0", "0"),
        stat_col("0:05", "2:40"),
    ]
    .concat();
    let sig = [
        stat_col(red, blue),
        stat_col("12 of 30", "25 of 40"),
        stat_col("40%", "62%"),
        stat_col("8 of 24", "20 of 33"),
        stat_col("3 of 4", "4 of 5"),
        stat_col("1 of 2", "1 of 2"),
        stat_col("12 of 30", "15 of 28"),
        stat_col("0 of 0", "2 of 2"),
        stat_col("0 of 0", "8 of 10"),
    ]
    .concat();
    format!(
        r#"<!doctype html><html><body>
<p class="b-fight-details__text">
  <i class="b-fight-details__text-item_first">Method: Submission</i>
  <i class="b-fight-details__text-item">Round: 1</i>
  <i class="b-fight-details__text-item">Time: 3:33</i>
  <i class="b-fight-details__text-item">Time format: 3 Rnd (5-5-5)</i>
  <i class="b-fight-details__text-item"><i class="b-fight-details__label">Referee:</i><span>Jason Herzog</span></i>
</p>
<p class="b-fight-details__collapse-link_tot">Totals</p>
<table><tbody class="b-fight-details__table-body"><tr>{totals}</tr></tbody></table>
<p class="b-fight-details__collapse-link_tot">Significant Strikes</p>
<table><tbody class="b-fight-details__table-body"><tr>{sig}</tr></tbody></table>
</body></html>"#
    )
}

fn fighter_html(base: &str, name: &str, fights: usize) -> String {
    let history = (0..fights)
        .map(|i| format!(r#"<a href="{base}/event-details/past-{i}">Event</a>"#))
        .collect::<String>();
    format!(
        r#"<!doctype html><html><body>
<span class="b-content__title-highlight">{name}</span>
<div class="b-list__info-box b-list__info-box_style_small-width js-guide"><ul>
  <li>Height: 6' 0"</li>
  <li>Weight: 170 lbs.</li>
  <li>Reach: 74"</li>
  <li>STANCE: Southpaw</li>
  <li>DOB: Jan 01, 1990</li>
</ul></div>
<div class="b-list__info-box b-list__info-box_style_middle-width js-guide clearfix"><ul>
  <li>SLpM: 3.21</li>
  <li>Str. Acc.: 45%</li>
  <li>SApM: 2.80</li>
  <li>Str. Def: 55%</li>
  <li>
  </li>
  <li>TD Avg.: 1.50</li>
  <li>TD Acc.: 40%</li>
  <li>TD Def.: 65%</li>
  <li>Sub. Avg.: 0.8</li>
</ul></div>
<div>{history}</div>
</body></html>"#
    )
}

/// A small copy of the site: an upcoming event, two completed events, their
/// bouts (one without statistics) and every fighter page.
fn fixture_site(base: &str) -> HashMap<String, String> {
    let mut pages = HashMap::new();
    pages.insert(
        LISTING_PATH.to_owned(),
        listing_html(base, &["upcoming", "e2", "e1"]),
    );

    let e2 = [
        Bout { id: "f3", red: "Ann Able", blue: "Bea Brown", draw: false },
        Bout { id: "f4", red: "Cat Cole", blue: "Dee Dunn", draw: true },
    ];
    let e1 = [Bout { id: "f1", red: "Ann Able", blue: "Eve East", draw: false }];
    pages.insert("/event-details/e2".to_owned(), event_html(base, "June 1, 2024", &e2));
    pages.insert("/event-details/e1".to_owned(), event_html(base, "May 4, 2024", &e1));

    pages.insert("/fight-details/f3".to_owned(), bout_html("Ann Able", "Bea Brown"));
    pages.insert("/fight-details/f4".to_owned(), bout_html("Cat Cole", "Dee Dunn"));
    // Not entered yet on the site.
    pages.insert(
        "/fight-details/f1".to_owned(),
        "<!doctype html><html><body><p>No data</p></body></html>".to_owned(),
    );

    for (name, fights) in [
        ("Ann Able", 7),
        ("Bea Brown", 3),
        ("Cat Cole", 12),
        ("Dee Dunn", 1),
        ("Eve East", 4),
    ] {
        pages.insert(
            format!("/fighter-details/{}", slug(name)),
            fighter_html(base, name, fights),
        );
    }
    pages
}

/// Serves the fixture site. The listing answers 503 once before succeeding.
fn spawn_site_server(
    drop_paths: &[&str],
) -> (String, Hits, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let base_url = format!("http://{}", server.server_addr());

    let mut pages = fixture_site(&base_url);
    for path in drop_paths {
        pages.remove(*path);
    }

    let hits: Hits = Arc::new(Mutex::new(HashMap::new()));
    let hits_for_server = hits.clone();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let path = request.url().to_owned();
            let seen = {
                let mut hits = hits_for_server.lock().expect("lock hits");
                let count = hits.entry(path.clone()).or_insert(0);
                *count += 1;
                *count
            };

            let (status, body) = match pages.get(&path) {
                Some(_) if path == LISTING_PATH && seen == 1 => (503, "busy".to_owned()),
                Some(body) => (200, body.clone()),
                None => (404, "not found".to_owned()),
            };

            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                    .expect("build header");
            let _ = request.respond(
                tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header),
            );
        }
    });

    (base_url, hits, shutdown_tx, handle)
}

fn run_update(base_url: &str, data_dir: &Path) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ufcstats-scraper");
    cmd.args([
        "update",
        "--data-dir",
        data_dir.to_str().unwrap(),
        "--base-url",
        base_url,
        "--backoff-factor",
        "0",
        "--timeout-secs",
        "10",
    ])
    .assert()
}

fn hits_for(hits: &Hits, path: &str) -> usize {
    hits.lock().expect("lock hits").get(path).copied().unwrap_or(0)
}

#[test]
fn update_builds_tables_and_rerun_is_idempotent() -> anyhow::Result<()> {
    let (base_url, hits, shutdown_tx, server_handle) = spawn_site_server(&[]);
    let temp = tempfile::TempDir::new()?;
    let data_dir = temp.path().join("data");

    run_update(&base_url, &data_dir)
        .success()
        .stderr(predicates::str::contains("adding new fighter"));

    let fights_path = data_dir.join(FIGHT_STATS_FILE);
    let fighters_path = data_dir.join(FIGHTER_STATS_FILE);

    let contents = fs::read_to_string(&fights_path)?;
    assert_eq!(contents.lines().next(), Some(FIGHT_COLUMNS.join(",").as_str()));

    let fights = load_fights(&fights_path)?;
    assert_eq!(fights.len(), 6);
    let events = fights.iter().map(|f| f.event_url.clone()).collect::<Vec<_>>();
    assert_eq!(events[0], format!("{base_url}/event-details/e2"));
    assert_eq!(events[5], format!("{base_url}/event-details/e1"));
    assert!(fights.iter().all(|f| !f.event_url.ends_with("/upcoming")));

    for pair in fights.chunks(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert_eq!(a.fight_url, b.fight_url);
        assert_eq!(a.fighter, b.opponent);
        assert_eq!(a.opponent_url, b.fighter_url);
        assert_eq!(a.date, b.date);
        assert_eq!(a.last_5_comps_per_event, 1);
    }

    assert_eq!(fights[0].result, FightResult::Win);
    assert_eq!(fights[1].result, FightResult::Loss);
    assert_eq!(fights[0].date, "June 1, 2024");
    assert_eq!(fights[0].referee.as_deref(), Some("Jason Herzog"));
    assert_eq!(fights[0].time_format.as_deref(), Some("5-5-5"));
    assert_eq!(fights[1].sub_attempts, Some(2));
    assert_eq!(fights[1].ground_strikes_landed, Some(8));
    assert_eq!(fights[1].ground_strikes_attempts, Some(10));
    assert_eq!(fights[2].result, FightResult::Draw);
    assert_eq!(fights[3].result, FightResult::Draw);

    // The bout without statistics is kept, with empty detailed fields.
    assert_eq!(fights[4].fight_url, format!("{base_url}/fight-details/f1"));
    assert_eq!(fights[4].knockdowns, None);
    assert_eq!(fights[5].takedowns_landed, None);

    let fighters = load_fighters(&fighters_path)?;
    assert_eq!(fighters.columns.len(), 15);
    assert_eq!(fighters.rows.len(), 5);
    let ann = fighters
        .rows
        .iter()
        .find(|f| f.name == "Ann Able")
        .expect("Ann Able on roster");
    assert_eq!(ann.height, "6' 0\"");
    assert_eq!(ann.reach, "74\"");
    assert_eq!(ann.stance, "Southpaw");
    assert_eq!(ann.dob, "Jan 01, 1990");
    assert_eq!(ann.column("Str_Acc"), "45");
    assert_eq!(ann.num_fights, 7);

    // Ann fought on both cards but is fetched once.
    assert_eq!(hits_for(&hits, "/fighter-details/ann-able"), 1);
    // The first listing request got a 503 and was retried.
    assert_eq!(hits_for(&hits, LISTING_PATH), 2);

    let fights_before = fs::read(&fights_path)?;
    let fighters_before = fs::read(&fighters_path)?;

    run_update(&base_url, &data_dir).success();

    assert_eq!(fs::read(&fights_path)?, fights_before);
    assert_eq!(fs::read(&fighters_path)?, fighters_before);
    assert_eq!(hits_for(&hits, "/event-details/e2"), 1);
    assert_eq!(hits_for(&hits, "/fighter-details/ann-able"), 1);

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();
    Ok(())
}

#[test]
fn failed_fetch_leaves_existing_tables_untouched() -> anyhow::Result<()> {
    let (base_url, _hits, shutdown_tx, server_handle) =
        spawn_site_server(&["/fighter-details/eve-east"]);
    let temp = tempfile::TempDir::new()?;
    let data_dir = temp.path().join("data");
    fs::create_dir_all(&data_dir)?;

    let fights_path = data_dir.join(FIGHT_STATS_FILE);
    let fighters_path = data_dir.join(FIGHTER_STATS_FILE);
    let header = format!("{}\n", FIGHT_COLUMNS.join(","));
    fs::write(&fights_path, &header)?;
    fs::write(&fighters_path, "name,height,reach,stance,dob,url,num_fights\n")?;

    run_update(&base_url, &data_dir)
        .failure()
        .stderr(predicates::str::contains("eve-east"));

    assert_eq!(fs::read_to_string(&fights_path)?, header);
    assert_eq!(
        fs::read_to_string(&fighters_path)?,
        "name,height,reach,stance,dob,url,num_fights\n"
    );

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();
    Ok(())
}
