/// The single built-in page: opens the SSE stream and renders the live
/// loss/accuracy feed. No frameworks, mirroring the rest of the studio.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>lacuna-nn studio</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 720px; margin: 40px auto; color: #222; }
  h1 { font-size: 1.3rem; }
  #status { margin: 12px 0; font-weight: 600; }
  #status.error { color: #b00020; }
  #status.done { color: #1a7f37; }
  table { border-collapse: collapse; width: 100%; font-size: .9rem; }
  th, td { border-bottom: 1px solid #ddd; padding: 4px 8px; text-align: right; }
  th:first-child, td:first-child { text-align: left; }
</style>
</head>
<body>
<h1>lacuna-nn &mdash; live imputation training</h1>
<p>Each refresh starts a fresh session: the dataset is loaded, a seeded
fraction of it is hidden, and the model trains while streaming one row per
epoch below.</p>
<div id="status">connecting&hellip;</div>
<table>
  <thead><tr><th>epoch</th><th>loss (masked MAE)</th><th>accuracy</th></tr></thead>
  <tbody id="rows"></tbody>
</table>
<script>
  const status = document.getElementById('status');
  const rows = document.getElementById('rows');
  const es = new EventSource('/train/events');

  es.addEventListener('epoch', (e) => {
    const m = JSON.parse(e.data);
    status.textContent = 'training: epoch ' + m.epoch;
    const tr = document.createElement('tr');
    tr.innerHTML = '<td>' + m.epoch + '</td><td>' + m.loss.toFixed(6) +
                   '</td><td>' + (m.accuracy * 100).toFixed(2) + '%</td>';
    rows.appendChild(tr);
  });

  es.addEventListener('done', (e) => {
    const m = JSON.parse(e.data);
    status.className = 'done';
    status.textContent = 'done: final MAE ' + m.metrics.mae.toFixed(6) +
                         ', artifacts at ' + m.model_path + ' and ' + m.imputed_path;
    es.close();
  });

  es.addEventListener('error', (e) => {
    if (!e.data) return; // EventSource network errors have no payload
    const m = JSON.parse(e.data);
    status.className = 'error';
    status.textContent = 'error: ' + m.message;
    es.close();
  });
</script>
</body>
</html>
"#;
