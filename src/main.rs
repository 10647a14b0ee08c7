use anyhow::Result;
use tokio::time::{interval, Duration};

use playercard::config::Config;
use playercard::counter::{Clock, MonotonicClock};
use playercard::loader::DataLoader;
use playercard::logging::{self, obj, v_num, v_str, Domain};
use playercard::page::{Page, PageEvent};
use playercard::shell;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    logging::info(
        Domain::System,
        "startup",
        obj(&[
            ("data_url", v_str(&cfg.data_url)),
            ("base", v_str(&cfg.base)),
            ("counter_duration_ms", v_num(cfg.counter_duration_ms)),
        ]),
    );

    let clock = MonotonicClock::default();
    let doc = match &cfg.shell_path {
        Some(path) => shell::from_file(path).await?,
        None => shell::document(),
    };
    let mut page = Page::new(doc, cfg.clone())?;
    let loader = DataLoader::new(cfg.base.clone());
    let outcome = page.init(&loader, &clock).await;

    if !outcome.is_absent() {
        let height = page.layout();
        let max_scroll = (height - cfg.viewport_height).max(0.0);
        let mut scroll_y = 0.0;

        // Scroll to the bottom a step per frame, then let counters finish.
        let mut ticker = interval(Duration::from_millis(cfg.frame_interval_ms.max(1)));
        let mut frames = 0u64;
        loop {
            ticker.tick().await;
            let now = clock.now_ms();
            if scroll_y < max_scroll {
                scroll_y = (scroll_y + cfg.scroll_step).min(max_scroll);
                page.dispatch(PageEvent::Scroll(scroll_y), now);
            }
            page.dispatch(PageEvent::Frame, now);
            frames += 1;
            if scroll_y >= max_scroll && page.is_settled() {
                break;
            }
        }
        logging::info(
            Domain::System,
            "settled",
            obj(&[
                ("frames", v_num(frames as f64)),
                ("elapsed_ms", v_num(clock.now_ms())),
                ("scroll_y", v_num(scroll_y)),
            ]),
        );
    }

    print!("{}", page.html());
    logging::info(
        Domain::System,
        "shutdown",
        obj(&[("populated", v_str(if outcome.is_absent() { "false" } else { "true" }))]),
    );
    Ok(())
}
