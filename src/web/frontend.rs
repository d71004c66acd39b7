//! Embedded HTML/CSS/JS frontend for the tagboard web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tagboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  gap: 16px;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}

header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }
header .user { display: flex; align-items: center; gap: 8px; color: var(--text-muted); }

nav {
  display: flex;
  gap: 4px;
  margin-bottom: 24px;
  background: var(--surface);
  border-radius: var(--radius);
  padding: 4px;
  border: 1px solid var(--border);
}

nav button {
  flex: 1;
  padding: 8px 16px;
  border: none;
  border-radius: 6px;
  background: transparent;
  color: var(--text-muted);
  font-size: 13px;
  font-weight: 500;
  cursor: pointer;
}

nav button:hover { color: var(--text); background: rgba(255,255,255,0.04); }
nav button.active { background: var(--accent); color: #fff; }

.panel { display: none; }
.panel.active { display: block; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}

.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }

.stats-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
  gap: 16px;
  margin-bottom: 16px;
}

.stat-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
  text-align: center;
}

.stat-card .value { font-size: 28px; font-weight: 700; font-family: var(--mono); color: var(--accent); }
.stat-card .value.yellow { color: var(--yellow); }
.stat-card .label {
  font-size: 12px;
  color: var(--text-muted);
  text-transform: uppercase;
  letter-spacing: 0.5px;
}

.controls { display: flex; flex-wrap: wrap; gap: 12px; align-items: flex-end; }
.controls label { display: flex; flex-direction: column; gap: 4px; font-size: 12px; color: var(--text-muted); }

input[type="text"], input[type="number"], select {
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 6px;
  color: var(--text);
  padding: 6px 10px;
  font-size: 13px;
  font-family: var(--mono);
  min-width: 140px;
}

input:focus, select:focus { outline: none; border-color: var(--accent); }
select[multiple] { min-height: 80px; }

.drop {
  border: 2px dashed var(--border);
  border-radius: var(--radius);
  padding: 20px;
  text-align: center;
  color: var(--text-muted);
  cursor: pointer;
}
.drop.over { border-color: var(--accent); color: var(--accent); }
.sources { margin-top: 8px; font-family: var(--mono); font-size: 12px; color: var(--text-muted); }

.grid-2 { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
@media (max-width: 900px) { .grid-2 { grid-template-columns: 1fr; } }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
th {
  color: var(--text-muted);
  font-weight: 500;
  font-size: 12px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}
td.num, th.num { text-align: right; font-family: var(--mono); }
tr:hover { background: rgba(255,255,255,0.02); }
.table-wrap { max-height: 520px; overflow: auto; }

.chart-box { background: #fff; border-radius: 6px; overflow: auto; }
.chart-box svg { display: block; }

.form-row { display: flex; align-items: center; gap: 12px; padding: 6px 0; }
.form-row label { flex: 0 0 160px; font-size: 13px; }

.btn {
  display: inline-flex;
  align-items: center;
  gap: 6px;
  padding: 8px 16px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text);
  font-size: 13px;
  cursor: pointer;
}
.btn:hover { border-color: var(--accent); color: var(--accent); }
.btn.primary { background: var(--accent); color: #fff; border-color: var(--accent); }
.btn.danger { border-color: var(--red); color: var(--red); }
.actions { display: flex; gap: 8px; margin-top: 16px; flex-wrap: wrap; }

.empty { color: var(--text-muted); padding: 24px; text-align: center; }
.hint { color: var(--text-muted); font-size: 12px; margin-top: 8px; }

.toast {
  position: fixed;
  bottom: 24px;
  right: 24px;
  background: var(--green);
  color: #fff;
  padding: 10px 20px;
  border-radius: var(--radius);
  font-size: 13px;
  opacity: 0;
  transform: translateY(10px);
  transition: all 0.3s;
  z-index: 1000;
}
.toast.show { opacity: 1; transform: translateY(0); }
.toast.error { background: var(--red); }
.toast.warn { background: var(--yellow); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1><span class="logo">tagboard</span> Tag Counts</h1>
    <div class="user">
      <span>User</span>
      <input type="text" id="user" placeholder="default">
    </div>
  </header>

  <nav id="nav">
    <button class="active" data-panel="dashboard">Dashboard</button>
    <button data-panel="categories">Categories</button>
    <button data-panel="settings">Chart Settings</button>
  </nav>

  <!-- Dashboard -->
  <div class="panel active" id="panel-dashboard">
    <div class="card">
      <div class="drop" id="drop">Drop JSONL files here or click to upload</div>
      <input type="file" id="file-input" multiple accept=".jsonl,.json,.txt" hidden>
      <div class="sources" id="sources"></div>
      <div class="actions">
        <button class="btn danger" id="clear-sources">Clear files</button>
      </div>
    </div>

    <div class="stats-grid">
      <div class="stat-card"><div class="value" id="stat-entries">0</div><div class="label">Tagged entries</div></div>
      <div class="stat-card"><div class="value" id="stat-displayed">0</div><div class="label">Displayed</div></div>
      <div class="stat-card"><div class="value" id="stat-sources">0</div><div class="label">Sources</div></div>
      <div class="stat-card"><div class="value yellow" id="stat-dropped">0</div><div class="label">Skipped lines</div></div>
    </div>

    <div class="card">
      <div class="controls">
        <label>Group by
          <select id="group">
            <option value="tag">Tag</option>
            <option value="file">File</option>
            <option value="category">Category</option>
          </select>
        </label>
        <label>Tag
          <select id="tag"><option>All</option></select>
        </label>
        <label>File
          <select id="file"><option>All</option></select>
        </label>
        <label>Files counted
          <select id="files" multiple></select>
        </label>
        <label>Chart
          <select id="chart">
            <option value="pie">Pie</option>
            <option value="bar">Bar</option>
          </select>
        </label>
        <label><span>Category column</span>
          <input type="checkbox" id="show-categories">
        </label>
      </div>
    </div>

    <div class="grid-2">
      <div class="card">
        <h2>Counts</h2>
        <div class="table-wrap" id="table"></div>
        <div class="actions">
          <button class="btn" id="export-csv">Download CSV</button>
        </div>
      </div>
      <div class="card">
        <h2>Chart</h2>
        <div class="chart-box" id="chart-box"></div>
        <div class="actions">
          <button class="btn" id="export-png">Download PNG</button>
          <button class="btn" id="mirror">Mirror to spreadsheet</button>
        </div>
      </div>
    </div>

    <div class="card">
      <h2>Uploaded tags by file <span class="hint" id="log-range"></span></h2>
      <div class="table-wrap" id="entry-log"></div>
      <div class="actions">
        <button class="btn" id="log-prev">Previous</button>
        <button class="btn" id="log-next">Next</button>
      </div>
    </div>
  </div>

  <!-- Categories -->
  <div class="panel" id="panel-categories">
    <div class="card">
      <h2>Category mapping</h2>
      <div id="categories"></div>
      <p class="hint" id="categories-hint"></p>
      <div class="actions">
        <button class="btn primary" id="save-categories">Save categories</button>
      </div>
    </div>
  </div>

  <!-- Settings -->
  <div class="panel" id="panel-settings">
    <div class="card">
      <h2>Chart settings <span class="hint" id="settings-state"></span></h2>
      <div class="form-row"><label for="s-title">Title</label><input type="text" id="s-title"></div>
      <div class="form-row"><label for="s-width">Width</label><input type="number" id="s-width" min="100" max="4000"></div>
      <div class="form-row"><label for="s-height">Height</label><input type="number" id="s-height" min="100" max="4000"></div>
      <div class="form-row"><label for="s-font">Font size</label><input type="number" id="s-font" min="6" max="96"></div>
      <div class="form-row"><label for="s-align">Title alignment</label>
        <select id="s-align">
          <option value="center">Center</option>
          <option value="left">Left</option>
          <option value="right">Right</option>
        </select>
      </div>
      <div class="form-row"><label for="s-style">Style preset</label>
        <select id="s-style">
          <option>Pastel</option>
          <option>Bold</option>
          <option>Professional</option>
        </select>
      </div>
      <div class="actions">
        <button class="btn primary" id="save-settings">Save settings</button>
      </div>
    </div>
  </div>
</div>

<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
let dashboard = null;
let selectedFiles = null; // null = every file
let logOffset = 0;
const LOG_LIMIT = 50;

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body, raw) {
  const opts = { method, headers: {} };
  if (raw !== undefined) {
    opts.body = raw;
  } else if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function toast(msg, kind) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (kind ? ' ' + kind : '');
  setTimeout(() => el.className = 'toast', 3500);
}

function esc(s) {
  return String(s).replace(/[&<>"']/g, c => ({
    '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
  })[c]);
}

function user() {
  return document.getElementById('user').value.trim();
}

function viewParams() {
  const p = new URLSearchParams();
  if (user()) p.set('user', user());
  p.set('group', document.getElementById('group').value);
  p.set('tag', document.getElementById('tag').value);
  p.set('file', document.getElementById('file').value);
  p.set('chart', document.getElementById('chart').value);
  if (document.getElementById('show-categories').checked) p.set('categories', '1');
  if (selectedFiles !== null) p.set('files', selectedFiles.join(','));
  p.set('log_offset', logOffset);
  p.set('log_limit', LOG_LIMIT);
  return p;
}

function userParams() {
  const p = new URLSearchParams();
  if (user()) p.set('user', user());
  return p;
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
document.getElementById('nav').addEventListener('click', e => {
  if (e.target.tagName !== 'BUTTON') return;
  const panel = e.target.dataset.panel;
  document.querySelectorAll('nav button').forEach(b => b.classList.remove('active'));
  e.target.classList.add('active');
  document.querySelectorAll('.panel').forEach(p => p.classList.remove('active'));
  document.getElementById('panel-' + panel).classList.add('active');
  loadPanel(panel);
});

function loadPanel(panel) {
  switch (panel) {
    case 'dashboard': return loadDashboard();
    case 'categories': return loadCategories();
    case 'settings': return loadSettings();
  }
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------
const drop = document.getElementById('drop');
const fileInput = document.getElementById('file-input');
drop.addEventListener('click', () => fileInput.click());
drop.addEventListener('dragover', e => { e.preventDefault(); drop.classList.add('over'); });
drop.addEventListener('dragleave', () => drop.classList.remove('over'));
drop.addEventListener('drop', e => {
  e.preventDefault();
  drop.classList.remove('over');
  upload(e.dataTransfer.files);
});
fileInput.addEventListener('change', () => { upload(fileInput.files); fileInput.value = ''; });

async function upload(files) {
  for (const f of files) {
    try {
      const buf = await f.arrayBuffer();
      const res = await api('POST', '/api/upload?name=' + encodeURIComponent(f.name), null, buf);
      const note = res.dropped_lines ? ` (${res.dropped_lines} lines skipped)` : '';
      toast(`${f.name}: ${res.entries} entries${note}`);
    } catch (e) {
      toast(`${f.name}: ${e.message}`, 'error');
    }
  }
  selectedFiles = null;
  logOffset = 0;
  loadDashboard();
}

document.getElementById('clear-sources').addEventListener('click', async () => {
  await api('DELETE', '/api/upload');
  selectedFiles = null;
  logOffset = 0;
  loadDashboard();
});

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------
['group', 'tag', 'file', 'chart', 'show-categories'].forEach(id =>
  document.getElementById(id).addEventListener('change', loadDashboard));
document.getElementById('user').addEventListener('change', () => {
  const active = document.querySelector('nav button.active').dataset.panel;
  loadPanel(active);
});
document.getElementById('files').addEventListener('change', e => {
  const all = [...e.target.options];
  const picked = all.filter(o => o.selected).map(o => o.value);
  selectedFiles = picked.length === all.length ? null : picked;
  loadDashboard();
});

async function loadDashboard() {
  try {
    dashboard = await api('GET', '/api/dashboard?' + viewParams());
    renderDashboard();
  } catch (e) {
    toast('Failed to load dashboard: ' + e.message, 'error');
  }
}

function fillSelect(id, options, keepAll) {
  const el = document.getElementById(id);
  const current = el.value;
  const values = keepAll ? ['All', ...options] : options;
  el.innerHTML = values.map(v => `<option>${esc(v)}</option>`).join('');
  if (values.includes(current)) el.value = current;
}

function renderDashboard() {
  const d = dashboard;
  document.getElementById('sources').textContent =
    d.sources.length ? d.sources.join('  ·  ') : 'No files loaded.';
  document.getElementById('stat-entries').textContent = d.totals.entries.toLocaleString();
  document.getElementById('stat-displayed').textContent = d.totals.displayed.toLocaleString();
  document.getElementById('stat-sources').textContent = d.totals.sources;
  document.getElementById('stat-dropped').textContent = d.totals.dropped_lines.toLocaleString();

  fillSelect('tag', d.tag_options, true);
  fillSelect('file', d.file_options, true);
  const files = document.getElementById('files');
  files.innerHTML = d.file_options.map(f => {
    const on = selectedFiles === null || selectedFiles.includes(f);
    return `<option${on ? ' selected' : ''}>${esc(f)}</option>`;
  }).join('');

  renderTable('table', d.table, 'No rows match the current selection.');
  document.getElementById('chart-box').innerHTML = renderChart(d.chart);
  renderEntryLog(d.entry_log);
}

function renderEntryLog(log) {
  renderTable('entry-log', log.table, 'No tagged entries yet.');
  const first = log.total ? log.offset + 1 : 0;
  const last = log.offset + log.table.rows.length;
  document.getElementById('log-range').textContent =
    log.total ? `${first}–${last} of ${log.total.toLocaleString()}` : '';
  document.getElementById('log-prev').disabled = log.offset === 0;
  document.getElementById('log-next').disabled = last >= log.total;
}

document.getElementById('log-prev').addEventListener('click', () => {
  logOffset = Math.max(0, logOffset - LOG_LIMIT);
  loadDashboard();
});
document.getElementById('log-next').addEventListener('click', () => {
  logOffset += LOG_LIMIT;
  loadDashboard();
});

function renderTable(id, table, emptyText) {
  const el = document.getElementById(id);
  if (!table.rows.length) {
    el.innerHTML = `<div class="empty">${esc(emptyText)}</div>`;
    return;
  }
  const countCol = table.columns.indexOf('Count');
  const head = table.columns.map((c, i) =>
    `<th${i === countCol ? ' class="num"' : ''}>${esc(c)}</th>`).join('');
  const body = table.rows.map(r => '<tr>' + r.map((cell, i) =>
    `<td${i === countCol ? ' class="num"' : ''}>${esc(cell)}</td>`).join('') + '</tr>').join('');
  el.innerHTML = `<table><thead><tr>${head}</tr></thead><tbody>${body}</tbody></table>`;
}

// ---------------------------------------------------------------------------
// Chart (SVG)
// ---------------------------------------------------------------------------
function renderChart(c) {
  const w = c.width, h = c.height, fs = c.font_size;
  const anchor = { left: 'start', center: 'middle', right: 'end' }[c.title_align];
  const tx = { left: 24, center: w / 2, right: w - 24 }[c.title_align];
  let svg = `<svg xmlns="http://www.w3.org/2000/svg" width="${w}" height="${h}" font-family="sans-serif">`;
  svg += `<rect width="${w}" height="${h}" fill="#fff"/>`;
  svg += `<text x="${tx}" y="${24 + fs}" font-size="${fs * 1.25}" text-anchor="${anchor}" fill="#333">${esc(c.title)}</text>`;
  const top = 24 + fs * 2;
  const total = c.slices.reduce((s, x) => s + x.value, 0);
  if (!total) {
    svg += `<text x="${w / 2}" y="${h / 2}" font-size="${fs}" text-anchor="middle" fill="#888">No data</text>`;
    return svg + '</svg>';
  }
  svg += c.kind === 'pie' ? pieSvg(c, w, h, top, fs) : barSvg(c, w, h, top, fs);
  return svg + '</svg>';
}

function pieSvg(c, w, h, top, fs) {
  const legendW = Math.min(w * 0.35, 260);
  const r = Math.max(10, Math.min(w - legendW - 48, h - top - 24) / 2);
  const cx = 24 + r, cy = top + (h - top) / 2;
  let out = '', angle = 0;
  c.slices.forEach(s => {
    if (!s.value) return;
    const sweep = s.fraction * Math.PI * 2;
    if (s.fraction >= 0.9999) {
      out += `<circle cx="${cx}" cy="${cy}" r="${r}" fill="${s.color}"><title>${esc(s.label)}: ${s.value}</title></circle>`;
    } else {
      const x1 = cx + r * Math.sin(angle), y1 = cy - r * Math.cos(angle);
      const x2 = cx + r * Math.sin(angle + sweep), y2 = cy - r * Math.cos(angle + sweep);
      const large = sweep > Math.PI ? 1 : 0;
      out += `<path d="M${cx},${cy} L${x1},${y1} A${r},${r} 0 ${large} 1 ${x2},${y2} Z" fill="${s.color}" stroke="#fff"><title>${esc(s.label)}: ${s.value}</title></path>`;
    }
    angle += sweep;
  });
  const lx = cx + r + 24;
  c.slices.forEach((s, i) => {
    const y = top + i * (fs + 8);
    if (y + fs > h) return;
    out += `<rect x="${lx}" y="${y}" width="${fs}" height="${fs}" fill="${s.color}"/>`;
    out += `<text x="${lx + fs + 6}" y="${y + fs - 2}" font-size="${fs * 0.85}" fill="#333">${esc(s.label)} (${(s.fraction * 100).toFixed(1)}%)</text>`;
  });
  return out;
}

function barSvg(c, w, h, top, fs) {
  const left = 48, bottom = h - fs * 3, max = Math.max(...c.slices.map(s => s.value), 1);
  const slot = (w - left - 24) / c.slices.length;
  const bw = Math.max(1, slot * 0.7);
  let out = `<line x1="${left}" y1="${bottom}" x2="${w - 24}" y2="${bottom}" stroke="#bbb"/>`;
  c.slices.forEach((s, i) => {
    const bh = (s.value / max) * (bottom - top - fs);
    const x = left + i * slot + (slot - bw) / 2;
    out += `<rect x="${x}" y="${bottom - bh}" width="${bw}" height="${bh}" fill="${s.color}"><title>${esc(s.label)}: ${s.value}</title></rect>`;
    out += `<text x="${x + bw / 2}" y="${bottom - bh - 4}" font-size="${fs * 0.75}" text-anchor="middle" fill="#333">${s.value}</text>`;
    out += `<text x="${x + bw / 2}" y="${bottom + fs}" font-size="${fs * 0.75}" text-anchor="middle" fill="#333">${esc(s.label)}</text>`;
  });
  return out;
}

// ---------------------------------------------------------------------------
// Exports / mirror
// ---------------------------------------------------------------------------
document.getElementById('export-csv').addEventListener('click', () => {
  window.location = '/api/export.csv?' + viewParams();
});
document.getElementById('export-png').addEventListener('click', () => {
  window.location = '/api/export.png?' + viewParams();
});
document.getElementById('mirror').addEventListener('click', async () => {
  try {
    const res = await api('POST', '/api/mirror?' + viewParams());
    if (res.ok) toast(`Mirrored ${res.rows} rows`);
    else toast(res.warning, 'warn');
  } catch (e) {
    toast(e.message, 'error');
  }
});

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------
async function loadCategories() {
  try {
    const res = await api('GET', '/api/categories?' + userParams());
    const el = document.getElementById('categories');
    if (!res.categories.length) {
      el.innerHTML = '<div class="empty">Upload files to edit the categories of their tags.</div>';
    } else {
      el.innerHTML = '<table><thead><tr><th>Tag</th><th>Category</th></tr></thead><tbody>' +
        res.categories.map(c => `<tr><td>${esc(c.tag)}</td><td><input type="text" data-tag="${esc(c.tag)}" value="${esc(c.category)}"></td></tr>`).join('') +
        '</tbody></table>';
    }
    const hidden = res.saved - res.categories.filter(c => c.category !== 'Other').length;
    document.getElementById('categories-hint').textContent =
      hidden > 0 ? `${hidden} saved mappings for tags not in the current files are kept.` : '';
  } catch (e) {
    toast('Failed to load categories: ' + e.message, 'error');
  }
}

document.getElementById('save-categories').addEventListener('click', async () => {
  const categories = [...document.querySelectorAll('#categories input[data-tag]')]
    .map(i => ({ tag: i.dataset.tag, category: i.value }));
  try {
    const res = await api('PUT', '/api/categories?' + userParams(), { categories });
    toast(`Saved ${res.applied} categories`);
    loadCategories();
  } catch (e) {
    toast('Save failed: ' + e.message, 'error');
  }
});

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------
async function loadSettings() {
  try {
    const res = await api('GET', '/api/settings?' + userParams());
    const s = res.settings;
    document.getElementById('s-title').value = s.chart_title;
    document.getElementById('s-width').value = s.width;
    document.getElementById('s-height').value = s.height;
    document.getElementById('s-font').value = s.font_size;
    document.getElementById('s-align').value = s.title_align;
    document.getElementById('s-style').value = s.style_preset;
    document.getElementById('settings-state').textContent =
      res.state === 'saved' ? '(saved)' : '(defaults)';
  } catch (e) {
    toast('Failed to load settings: ' + e.message, 'error');
  }
}

document.getElementById('save-settings').addEventListener('click', async () => {
  const settings = {
    chart_title: document.getElementById('s-title').value,
    width: parseInt(document.getElementById('s-width').value, 10),
    height: parseInt(document.getElementById('s-height').value, 10),
    font_size: parseInt(document.getElementById('s-font').value, 10),
    title_align: document.getElementById('s-align').value,
    style_preset: document.getElementById('s-style').value,
  };
  try {
    await api('PUT', '/api/settings?' + userParams(), settings);
    toast('Chart settings saved');
    loadSettings();
  } catch (e) {
    toast('Save failed: ' + e.message, 'error');
  }
});

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
loadDashboard();
</script>
</body>
</html>
"##;
