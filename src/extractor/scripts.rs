//! In-page JavaScript payloads sent through Runtime.evaluate.
//!
//! Each logical step uses a fixed request id so pending evaluations on the
//! same socket stay distinguishable.

/// Request id for the player-response readiness probe
pub const PROBE_ID: u64 = 999;
/// Request id for metadata retrieval
pub const METADATA_ID: u64 = 2;
/// Request id for DOM extraction
pub const DOM_ID: u64 = 10;
/// Request id for API extraction
pub const API_ID: u64 = 20;

/// True once YouTube's embedded player response object exists.
pub const PROBE: &str = "(!!window.ytInitialPlayerResponse).toString()";

/// Reads title, channel and best-guess caption language out of
/// ytInitialPlayerResponse. Every field tolerates absence.
pub const METADATA: &str = r#"
(function() {
    var pr = window.ytInitialPlayerResponse;
    if (!pr) return JSON.stringify({});

    var title = '';
    var channel = '';
    var language = '';
    try { title = pr.videoDetails.title || ''; } catch (e) {}
    try { channel = pr.videoDetails.author || ''; } catch (e) {}
    try {
        var tracks = pr.captions.playerCaptionsTracklistRenderer.captionTracks || [];
        var preferred = tracks.find(function(t) {
            return (t.languageCode || '').indexOf('en') === 0;
        }) || tracks[0];
        if (preferred) language = preferred.languageCode || '';
    } catch (e) {}

    return JSON.stringify({title: title, channel: channel, language: language});
})()
"#;

/// Clicks "Show transcript", scrapes the segment text nodes, and restores the
/// prior panel state. Resolves to {text} on success or {error} on any missed
/// step; never throws.
///
/// `{{SETTLE_MS}}` is substituted with the configured segment settle period.
pub const DOM: &str = r#"
(async function() {
    function sleep(ms) { return new Promise(function(r) { setTimeout(r, ms); }); }

    async function waitFor(selector, timeoutMs) {
        var deadline = Date.now() + timeoutMs;
        while (Date.now() < deadline) {
            var el = document.querySelector(selector);
            if (el) return el;
            await sleep(200);
        }
        return null;
    }

    try {
        var button = await waitFor('button[aria-label="Show transcript"]', 5000);
        if (!button) return JSON.stringify({error: 'no_button'});

        var panelSelector = 'ytd-transcript-segment-list-renderer';
        var wasOpen = !!document.querySelector(panelSelector);
        if (!wasOpen) {
            button.click();
            var panel = await waitFor(panelSelector, 5000);
            if (!panel) return JSON.stringify({error: 'no_panel'});
        }

        await sleep({{SETTLE_MS}});

        var segments = document.querySelectorAll(
            'ytd-transcript-segment-renderer .segment-text');
        var parts = [];
        segments.forEach(function(seg) {
            var text = (seg.textContent || '').trim();
            if (text) parts.push(text);
        });

        if (!wasOpen) button.click();

        var text = parts.join(' ').replace(/\s+/g, ' ').trim();
        return JSON.stringify({text: text});
    } catch (e) {
        return JSON.stringify({error: String(e)});
    }
})()
"#;

/// Fetches the preferred caption track from inside the page (so the request
/// carries the page's session credentials), preferring the structured json3
/// format and falling back to the raw timedtext markup.
pub const API: &str = r#"
(async function() {
    function collapse(text) { return text.replace(/\s+/g, ' ').trim(); }

    try {
        var pr = window.ytInitialPlayerResponse;
        var tracks = [];
        try {
            tracks = pr.captions.playerCaptionsTracklistRenderer.captionTracks || [];
        } catch (e) {}
        if (!tracks.length) return JSON.stringify({error: 'no tracks'});

        var preferred = tracks.find(function(t) {
            return (t.languageCode || '').indexOf('en') === 0;
        }) || tracks[0];

        // Tracks that already pin a format reject a second fmt parameter
        var url = preferred.baseUrl +
            (preferred.baseUrl.indexOf('fmt=') === -1 ? '&fmt=json3' : '');
        var resp = await fetch(url, {credentials: 'include'});
        if (resp.ok) {
            var data = await resp.json();
            var lines = [];
            (data.events || []).forEach(function(event) {
                if (!event.segs) return;
                var line = event.segs.map(function(s) { return s.utf8 || ''; }).join('').trim();
                if (line) lines.push(line);
            });
            return JSON.stringify({text: collapse(lines.join(' '))});
        }

        // Some tracks reject the format override; retry raw and parse markup
        resp = await fetch(preferred.baseUrl, {credentials: 'include'});
        if (!resp.ok) return JSON.stringify({error: 'fetch failed: ' + resp.status});

        var xml = new DOMParser().parseFromString(await resp.text(), 'text/xml');
        var parts = [];
        xml.querySelectorAll('text').forEach(function(node) {
            var text = (node.textContent || '').trim();
            if (text) parts.push(text);
        });
        return JSON.stringify({text: collapse(parts.join(' '))});
    } catch (e) {
        return JSON.stringify({error: String(e)});
    }
})()
"#;

/// Render the DOM script with the configured settle period.
pub fn dom_script(settle_ms: u64) -> String {
    DOM.replace("{{SETTLE_MS}}", &settle_ms.to_string())
}
