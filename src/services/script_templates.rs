//! 页面脚本模板
//!
//! 三段脚本都以立即执行函数的形式求值，返回一个字符串标记：
//! - 填写: `filled:<题数>` 或 `error:<信息>`
//! - 翻页/提交: `next` / `submit` / `not_found`
//! - 状态检测: `completed` / `quota_exceeded` / `in_progress`

/// 作答表占位符，编译时替换为 JSON
pub(crate) const TABLES_PLACEHOLDER: &str = "__ANSWER_TABLES__";

/// 填写当前页可见题目
///
/// 作答表按 (表族, 族内序号) 组织，`index` 把页面题号映射到该键。
/// 页面题型与表族不一致或查不到配置时按均匀随机作答。
pub(crate) const FILL_TEMPLATE: &str = r#"
(function () {
  var TABLES = __ANSWER_TABLES__;
  var DELIMITER = '||';
  var DEFAULT_TEXT = '无';

  function isVisible(el) {
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
  }

  function notify(el, names) {
    names.forEach(function (name) {
      el.dispatchEvent(new Event(name, { bubbles: true }));
    });
  }

  function uniform(n) {
    return Math.floor(Math.random() * n);
  }

  function weightedIndex(weights, n) {
    if (!weights || weights.length === 0) return uniform(n);
    var total = 0;
    for (var i = 0; i < weights.length; i++) total += Math.max(0, weights[i]);
    if (!(total > 0)) return uniform(n);
    var r = Math.random() * total;
    var sum = 0;
    // 严格大于：r 取到 0 时也不会落在权重为 0 的选项上
    for (var j = 0; j < weights.length; j++) {
      sum += Math.max(0, weights[j]);
      if (sum > r) return j;
    }
    for (var k = weights.length - 1; k >= 0; k--) {
      if (weights[k] > 0) return k;
    }
    return weights.length - 1;
  }

  function pick(n, weights) {
    var idx = weightedIndex(weights, n);
    return idx < n ? idx : uniform(n);
  }

  function lookup(topic, family) {
    var key = TABLES.index[topic];
    if (!key || key[0] !== family) return null;
    var table = TABLES[family];
    return table ? table[key[1]] : null;
  }

  function fillText(q, entry) {
    var inputs = q.querySelectorAll('input[type="text"], textarea');
    if (inputs.length === 0) return false;
    var candidates = entry && entry.length ? entry : [DEFAULT_TEXT];
    var answer = candidates[uniform(candidates.length)];
    var parts = answer.indexOf(DELIMITER) > -1 ? answer.split(DELIMITER) : null;
    inputs.forEach(function (input, i) {
      input.value = parts ? (parts[i] || parts[0]) : answer;
      notify(input, ['input', 'change']);
    });
    return true;
  }

  function clickChoice(q, entry, selector) {
    var options = q.querySelectorAll(selector);
    if (options.length === 0) return false;
    options[pick(options.length, entry)].click();
    return true;
  }

  function fillMultiple(q, entry) {
    var options = q.querySelectorAll('.ui-controlgroup > div');
    if (options.length === 0) return false;
    var selected = [];
    for (var i = 0; i < options.length; i++) {
      var p = entry && typeof entry[i] === 'number' ? entry[i] : 50;
      if (Math.random() * 100 < p) selected.push(i);
    }
    if (selected.length === 0) selected.push(uniform(options.length));
    selected.forEach(function (i) {
      options[i].click();
    });
    return true;
  }

  function fillMatrix(q, topic, entry) {
    var rows = q.querySelectorAll('tr[rowindex]');
    if (rows.length === 0) {
      var table = document.getElementById('divRefTab' + topic);
      if (table) rows = table.querySelectorAll('tr[rowindex]');
    }
    if (rows.length === 0) return false;
    rows.forEach(function (row) {
      var cells = row.querySelectorAll('td');
      if (cells.length <= 1) return;
      cells[pick(cells.length - 1, entry) + 1].click();
    });
    return true;
  }

  function fillDropdown(q, topic, entry) {
    var select = q.querySelector('select') || document.getElementById('q' + topic);
    if (!select) return false;
    var options = select.querySelectorAll('option');
    if (options.length <= 1) return false;
    select.selectedIndex = pick(options.length - 1, entry) + 1;
    notify(select, ['change']);
    return true;
  }

  function fillSlider(q) {
    var input = q.querySelector('input[type="hidden"], input[type="text"], input[type="range"]');
    if (!input) return false;
    input.value = uniform(100) + 1;
    notify(input, ['input', 'change']);
    return true;
  }

  function fillRanking(q) {
    var items = q.querySelectorAll('ul > li');
    if (items.length === 0) return false;
    var order = [];
    for (var i = 0; i < items.length; i++) order.push(i);
    for (var k = order.length - 1; k > 0; k--) {
      var j = Math.floor(Math.random() * (k + 1));
      var tmp = order[k];
      order[k] = order[j];
      order[j] = tmp;
    }
    order.forEach(function (idx) {
      items[idx].click();
    });
    return true;
  }

  try {
    var blocks = document.querySelectorAll('#divQuestion div[topic]');
    var filled = 0;
    for (var b = 0; b < blocks.length; b++) {
      var q = blocks[b];
      if (!isVisible(q)) continue;
      var topic = (q.getAttribute('topic') || '').trim();
      var family = TABLES.codes[(q.getAttribute('type') || '').trim()];
      if (!family) continue;
      var entry = lookup(topic, family);
      var done = false;
      switch (family) {
        case 'text':
          done = fillText(q, entry);
          break;
        case 'single':
          done = clickChoice(q, entry, '.ui-controlgroup > div');
          break;
        case 'scale':
          done = clickChoice(q, entry, '.scale-rating li, .ui-controlgroup li, .ui-controlgroup > div');
          break;
        case 'multiple':
          done = fillMultiple(q, entry);
          break;
        case 'matrix':
          done = fillMatrix(q, topic, entry);
          break;
        case 'dropdown':
          done = fillDropdown(q, topic, entry);
          break;
        case 'slider':
          done = fillSlider(q);
          break;
        case 'ranking':
          done = fillRanking(q);
          break;
      }
      if (done) filled++;
    }
    return 'filled:' + filled;
  } catch (e) {
    return 'error:' + (e && e.message ? e.message : String(e));
  }
})()
"#;

/// 点击下一页，没有下一页时点击提交
pub(crate) const ADVANCE_SCRIPT: &str = r#"
(function () {
  function isVisible(el) {
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
  }
  var next = document.querySelector('#divNext, .next-btn');
  if (next && isVisible(next)) {
    next.click();
    return 'next';
  }
  var submit = document.querySelector('#ctlNext, #submit_button, #divSubmit, #SM_BTN_1');
  if (submit) {
    submit.click();
    return 'submit';
  }
  return 'not_found';
})()
"#;

/// 检测页面状态（只读）
pub(crate) const STATUS_CHECK_SCRIPT: &str = r#"
(function () {
  var url = window.location.href;
  if (url.indexOf('complete') > -1 || url.indexOf('finish') > -1) {
    return 'completed';
  }
  var body = (document.body && document.body.innerText) || '';
  if (body.indexOf('答卷已经提交') > -1 || body.indexOf('感谢您的参与') > -1) {
    return 'completed';
  }
  if (body.indexOf('设备已达到最大填写次数') > -1) {
    return 'quota_exceeded';
  }
  return 'in_progress';
})()
"#;
