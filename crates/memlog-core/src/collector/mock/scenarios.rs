//! Pre-built `dumpsys meminfo` scenarios for testing.
//!
//! The texts mirror what `adb shell dumpsys meminfo` prints on a device,
//! trimmed to the sections the extractor cares about.

use super::runner::{MockResponse, MockRunner};
use crate::collector::DEFAULT_PACKAGE;

/// App-scoped dump of a running application.
///
/// PSS total is 187654 kB, Java heap is 31234 kB.
pub const APP_MEMINFO_TYPICAL: &str = "\
Applications Memory Usage (in Kilobytes):
Uptime: 91238740 Realtime: 91238740

** MEMINFO in pid 12345 [com.google.android.youtube] **
                   Pss  Private  Private  SwapPss      Rss     Heap     Heap     Heap
                 Total    Dirty    Clean    Dirty    Total     Size    Alloc     Free
                ------   ------   ------   ------   ------   ------   ------   ------
  Native Heap    45678    45600        0       12    47000    65536    50000    15536
  Dalvik Heap    23456    23400        0        4    25000    40000    30000    10000
 Dalvik Other     4321     4300        0        0     5000
        Stack     1234     1234        0        0     1300
       Ashmem      120      100        0        0      600
    Other dev       40        0       40        0      300
     .so mmap    20345      900    12000       20    60000
    .apk mmap     9876        0     8000        0    30000
    .dex mmap    30000        4    29000        0    40000
    Other mmap     800       10      600        0     3000
    GL mtrack    40000    40000        0        0    40000
      Unknown    11884    11800        0       64    12000
        TOTAL   187654   127348    49640      100   264200   105536    80000    25536

 App Summary
                       Pss(KB)                        Rss(KB)
                        ------                         ------
           Java Heap:    31234                          45678
         Native Heap:    45600                          47000
                Code:    49904                         130000
               Stack:     1234                           1300
            Graphics:    40000                          40000
       Private Other:     2850
              System:    16832
             Unknown:                                    1000

           TOTAL PSS:   187654            TOTAL RSS:   264200       TOTAL SWAP PSS:      100

 Objects
               Views:      512         ViewRootImpl:        2
         AppContexts:        6           Activities:        1
";

/// System-wide dump. Free RAM is 3456789 kB.
pub const SYSTEM_MEMINFO_TYPICAL: &str = "\
Applications Memory Usage (in Kilobytes):
Uptime: 91238740 Realtime: 91238740

Total PSS by process:
    187654K: com.google.android.youtube (pid 12345 / activities)
    154321K: system (pid 1234)
    98765K: com.android.systemui (pid 2345)

Total PSS by OOM adjustment:
    412345K: Native
    154321K: System
    187654K: Foreground

Total RAM: 7823456 kB (status normal)
 Free RAM: 3456789 kB (  456789 kB cached pss +  2500000 kB cached kernel +   500000 kB free)
 Used RAM: 3987654 kB (  3200000 kB used pss +   787654 kB kernel)
 Lost RAM:   379013 kB
     ZRAM:    12345 kB physical used for    45678 kB in swap ( 4194300 kB total swap)
   Tuning: 256 (large 512), oom   322560 kB, restore limit   107520 kB (high-end-gfx)
";

/// App-scoped dump printed when the package has no running process.
pub const APP_NOT_RUNNING: &str = "\
Applications Memory Usage (in Kilobytes):
Uptime: 91238740 Realtime: 91238740
No process found for: com.google.android.youtube
";

/// App-scoped dump with a different layout where none of the labels appear.
pub const APP_MEMINFO_NO_LABELS: &str = "\
** MEMINFO in pid 12345 [com.google.android.youtube] **
  Native Heap    45678
  Dalvik Heap    23456
  Sum            69134
";

impl MockRunner {
    /// A device with the default package running and healthy output.
    pub fn typical_device() -> Self {
        Self::device_with(DEFAULT_PACKAGE, APP_MEMINFO_TYPICAL, SYSTEM_MEMINFO_TYPICAL)
    }

    /// A device whose dumps for `package` return the given texts.
    pub fn device_with(package: &str, app_text: &str, system_text: &str) -> Self {
        let mut runner = Self::new();
        runner.respond_stdout(&["shell", "dumpsys", "meminfo", package], app_text);
        runner.respond_stdout(&["shell", "dumpsys", "meminfo"], system_text);
        runner
    }

    /// No device attached: every invocation fails like `adb` does.
    pub fn no_device() -> Self {
        let mut runner = Self::new();
        let offline = MockResponse::Exit {
            code: 1,
            stderr: "adb: no devices/emulators found\n".to_string(),
        };
        runner.respond(&["shell", "dumpsys", "meminfo", DEFAULT_PACKAGE], offline.clone());
        runner.respond(&["shell", "dumpsys", "meminfo"], offline);
        runner
    }
}
