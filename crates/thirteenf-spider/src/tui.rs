use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A progress bar over `len` items, or a hidden one when the tui is off.
pub(crate) fn progress_bar(tui: bool, len: u64, msg: &'static str) -> anyhow::Result<ProgressBar> {
    if !tui {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len).with_style(
        ProgressStyle::default_bar()
            .template(
                "{msg} {spinner:.magenta}\n\
                [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} \
                [Rate: {per_sec:.magenta}, ETA: {eta:.blue}]",
            )?
            .progress_chars("##-"),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
